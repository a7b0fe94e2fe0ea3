// ABOUTME: Backend selection for a sweep.
// ABOUTME: Maps the configured backend kind and its settings to a resolved choice.

use crate::registry::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which registry to sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Amazon ECR.
    #[default]
    Ecr,
    /// Local Docker or Podman image store.
    Engine,
    /// JSON inventory file, nothing leaves the process.
    Snapshot,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Ecr => write!(f, "ecr"),
            BackendKind::Engine => write!(f, "engine"),
            BackendKind::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Fully resolved backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    Ecr { region: Option<String> },
    Engine(EngineConfig),
    Snapshot { path: PathBuf },
}

impl BackendSettings {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendSettings::Ecr { .. } => BackendKind::Ecr,
            BackendSettings::Engine(_) => BackendKind::Engine,
            BackendSettings::Snapshot { .. } => BackendKind::Snapshot,
        }
    }
}
