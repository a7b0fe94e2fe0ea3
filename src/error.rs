// ABOUTME: Application-wide error types for regprune.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::registry::{BackendError, FetchError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} deletion(s) failed")]
    DeletionsFailed(usize),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Failed deletions exit with 2 so callers can tell them apart from
    /// runs that never got to delete anything.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DeletionsFailed(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
