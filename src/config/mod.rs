// ABOUTME: Configuration types and parsing for regprune.yml.
// ABOUTME: Handles YAML parsing, discovery, command-line overrides, and template generation.

mod backend;

pub use backend::{BackendKind, BackendSettings};

use crate::error::{Error, Result};
use crate::registry::EngineConfig;
use crate::retention::{KEEP_PER_TRACK, RetentionPolicy};
use crate::types::{RepositoryName, TagPrefixes};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "regprune.yml";
pub const CONFIG_FILENAME_ALT: &str = "regprune.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".regprune/config.yml";

/// Contents of a config file. Every field is optional so flags can fill gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub retention_days: Option<u32>,

    #[serde(default)]
    pub tag_prefixes: TagPrefixes,

    #[serde(default)]
    pub keep_per_track: Option<usize>,

    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub snapshot: Option<PathBuf>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub repositories: Vec<RepositoryName>,

    #[serde(default)]
    pub concurrency: Option<usize>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Values supplied on the command line. `Some` wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub retention_days: Option<u32>,
    pub tag_prefixes: Option<TagPrefixes>,
    pub keep_per_track: Option<usize>,
    pub backend: Option<BackendKind>,
    pub snapshot: Option<PathBuf>,
    pub repositories: Vec<RepositoryName>,
    pub concurrency: Option<usize>,
    pub dry_run: bool,
    pub log_file: Option<PathBuf>,
}

/// Everything a sweep needs, resolved once and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupSettings {
    pub backend: BackendSettings,
    pub policy: RetentionPolicy,
    pub dry_run: bool,
    pub repositories: Vec<RepositoryName>,
    pub concurrency: usize,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is a valid, empty config
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Using config file {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Load `explicit` if given, otherwise discover in `dir`, otherwise fall
    /// back to an empty config so flags alone can drive the run.
    pub fn locate(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if overrides.region.is_some() {
            self.region = overrides.region;
        }
        if overrides.retention_days.is_some() {
            self.retention_days = overrides.retention_days;
        }
        if let Some(prefixes) = overrides.tag_prefixes {
            self.tag_prefixes = prefixes;
        }
        if overrides.keep_per_track.is_some() {
            self.keep_per_track = overrides.keep_per_track;
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if overrides.snapshot.is_some() {
            self.snapshot = overrides.snapshot;
        }
        if !overrides.repositories.is_empty() {
            self.repositories = overrides.repositories;
        }
        if overrides.concurrency.is_some() {
            self.concurrency = overrides.concurrency;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        self.dry_run |= overrides.dry_run;
        self
    }

    /// Resolve just the backend choice.
    pub fn backend_settings(&self) -> Result<BackendSettings> {
        match self.backend {
            BackendKind::Ecr => Ok(BackendSettings::Ecr {
                region: self.region.clone(),
            }),
            BackendKind::Engine => Ok(BackendSettings::Engine(self.engine.clone())),
            BackendKind::Snapshot => {
                let path = self
                    .snapshot
                    .clone()
                    .ok_or(Error::MissingSetting("snapshot"))?;
                Ok(BackendSettings::Snapshot { path })
            }
        }
    }

    /// Validate and resolve everything a sweep needs.
    pub fn cleanup_settings(&self) -> Result<CleanupSettings> {
        let retention_days = self
            .retention_days
            .ok_or(Error::MissingSetting("retention_days"))?;

        let concurrency = self.concurrency.unwrap_or(1);
        if concurrency == 0 {
            return Err(Error::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let policy = RetentionPolicy::new(retention_days, self.tag_prefixes.clone())
            .with_keep_per_track(self.keep_per_track.unwrap_or(KEEP_PER_TRACK));

        Ok(CleanupSettings {
            backend: self.backend_settings()?,
            policy,
            dry_run: self.dry_run,
            repositories: self.repositories.clone(),
            concurrency,
        })
    }
}

/// Values `init` writes into the template.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub region: Option<String>,
    pub retention_days: Option<u32>,
    pub tag_prefixes: Option<TagPrefixes>,
}

pub fn init_config(dir: &Path, options: &InitOptions, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(options);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(options: &InitOptions) -> String {
    let prefixes = match options.tag_prefixes {
        Some(ref p) if !p.is_empty() => p.clone(),
        _ => TagPrefixes::parse_list("prod").unwrap_or_default(),
    };
    let prefix_lines: String = prefixes
        .iter()
        .map(|p| format!("  - {}\n", p))
        .collect();

    format!(
        r#"# Images older than this many days are deleted unless a track protects them.
retention_days: {}
# Each prefix is a track; its {} most recent images are always kept.
tag_prefixes:
{}keep_per_track: {}
backend: ecr
region: {}
"#,
        options.retention_days.unwrap_or(30),
        KEEP_PER_TRACK,
        prefix_lines,
        KEEP_PER_TRACK,
        options.region.as_deref().unwrap_or("us-east-1"),
    )
}
