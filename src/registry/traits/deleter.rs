// ABOUTME: Image deletion trait for registry backends.
// ABOUTME: One call deletes one batch and reports per-digest failures.

use super::sealed::Sealed;
use crate::types::{Digest, RepositoryName};
use async_trait::async_trait;
use serde::Serialize;

/// Batched image deletion.
#[async_trait]
pub trait ImageDeleter: Sealed + Send + Sync {
    /// Delete `digests` from `repository` in a single backend call.
    ///
    /// A digest that could not be deleted is reported in
    /// [`BatchOutcome::failures`]; `Err` means the whole call failed.
    async fn delete_batch(
        &self,
        repository: &RepositoryName,
        digests: &[Digest],
    ) -> Result<BatchOutcome, DeleteError>;
}

/// Result of one batch call.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub deleted: Vec<Digest>,
    pub failures: Vec<DeletionFailure>,
}

/// A digest the backend refused or failed to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    pub digest: Digest,
    pub reason: String,
}

impl DeletionFailure {
    pub fn new(digest: Digest, reason: impl Into<String>) -> Self {
        Self {
            digest,
            reason: reason.into(),
        }
    }
}

/// Errors that fail a whole batch call.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("batch delete failed: {0}")]
    Batch(String),
}
