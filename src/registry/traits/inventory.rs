// ABOUTME: Inventory trait for listing repositories and their images.
// ABOUTME: Fetch failures propagate; an empty repository is not an error.

use super::sealed::Sealed;
use crate::retention::ImageRecord;
use crate::types::RepositoryName;
use async_trait::async_trait;

/// Read access to a registry's repositories and image records.
#[async_trait]
pub trait Inventory: Sealed + Send + Sync {
    /// List every repository visible to the caller.
    async fn list_repositories(&self) -> Result<Vec<RepositoryName>, FetchError>;

    /// List image records of one repository. Returns an empty list when the
    /// repository holds no images.
    async fn list_images(&self, repository: &RepositoryName)
    -> Result<Vec<ImageRecord>, FetchError>;
}

/// Errors from listing a registry. All of them are treated as transient by
/// the registry side and fatal for the current run.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to list repositories: {0}")]
    Repositories(String),

    #[error("failed to list images in {repository}: {message}")]
    Images {
        repository: RepositoryName,
        message: String,
    },

    #[error("registry throttled the request: {0}")]
    Throttled(String),

    #[error("registry rejected the credentials: {0}")]
    Unauthorized(String),
}

impl FetchError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, FetchError::Throttled(_))
    }
}
