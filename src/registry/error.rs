// ABOUTME: Backend setup errors with SNAFU pattern.
// ABOUTME: Unifies engine detection, engine connection, and snapshot loading failures.

use snafu::Snafu;
use std::path::PathBuf;

use super::detection::DetectionError;

/// Failure to construct a registry backend.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BackendError {
    #[snafu(display("container engine detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("container engine connection failed: {message}"))]
    EngineConnect { message: String },

    #[snafu(display("failed to read snapshot {}: {source}", path.display()))]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid snapshot: {source}"))]
    SnapshotParse { source: serde_json::Error },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// No Docker or Podman socket found.
    NoEngineFound,
    /// Socket found but the client could not be created.
    ConnectionFailed,
    /// Snapshot file missing or malformed.
    InvalidSnapshot,
}

impl BackendError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Detection {
                source: DetectionError::NoEngineFound,
            } => BackendErrorKind::NoEngineFound,
            BackendError::EngineConnect { .. } => BackendErrorKind::ConnectionFailed,
            BackendError::SnapshotRead { .. } | BackendError::SnapshotParse { .. } => {
                BackendErrorKind::InvalidSnapshot
            }
        }
    }
}

impl From<DetectionError> for BackendError {
    fn from(source: DetectionError) -> Self {
        BackendError::Detection { source }
    }
}
