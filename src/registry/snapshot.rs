// ABOUTME: In-memory registry backed by a JSON inventory snapshot.
// ABOUTME: Used for offline previews and as the test double for the sweep driver.

use super::error::{BackendError, SnapshotParseSnafu, SnapshotReadSnafu};
use super::traits::sealed::Sealed;
use super::traits::{BatchOutcome, DeleteError, DeletionFailure, FetchError, ImageDeleter, Inventory};
use crate::retention::ImageRecord;
use crate::types::{Digest, RepositoryName};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use snafu::ResultExt;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// On-disk snapshot format.
///
/// ```json
/// { "repositories": { "web": [ { "digest": "sha256:..", "tags": ["prod-1"],
///   "pushed_at": "2024-01-01T00:00:00Z" } ] },
///   "rejected_digests": ["sha256:.."] }
/// ```
///
/// Deleting a digest listed in `rejected_digests` always fails.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    repositories: BTreeMap<RepositoryName, Vec<ImageRecord>>,
    #[serde(default)]
    rejected_digests: HashSet<Digest>,
}

/// Registry whose contents live in memory. Deletions mutate that memory only.
#[derive(Default)]
pub struct SnapshotRegistry {
    repositories: Mutex<BTreeMap<RepositoryName, Vec<ImageRecord>>>,
    rejected: Mutex<HashSet<Digest>>,
    unreachable: Mutex<HashSet<RepositoryName>>,
    offline: Mutex<bool>,
    batches: Mutex<Vec<usize>>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a repository.
    pub fn with_repository(self, name: RepositoryName, images: Vec<ImageRecord>) -> Self {
        self.repositories.lock().insert(name, images);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, BackendError> {
        let file: SnapshotFile = serde_json::from_str(json).context(SnapshotParseSnafu)?;
        Ok(Self {
            repositories: Mutex::new(file.repositories),
            rejected: Mutex::new(file.rejected_digests),
            ..Self::default()
        })
    }

    pub fn load(path: &Path) -> Result<Self, BackendError> {
        let content = std::fs::read_to_string(path).context(SnapshotReadSnafu { path })?;
        Self::from_json(&content)
    }

    /// Make every future deletion of `digest` fail.
    pub fn reject_deletion_of(&self, digest: Digest) {
        self.rejected.lock().insert(digest);
    }

    /// Make listing images of `repository` fail.
    pub fn make_unreachable(&self, repository: RepositoryName) {
        self.unreachable.lock().insert(repository);
    }

    /// Make listing repositories fail.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    /// Current images of a repository.
    pub fn images(&self, repository: &RepositoryName) -> Vec<ImageRecord> {
        self.repositories
            .lock()
            .get(repository)
            .cloned()
            .unwrap_or_default()
    }

    /// Sizes of the batch calls received so far.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }
}

impl Sealed for SnapshotRegistry {}

#[async_trait]
impl Inventory for SnapshotRegistry {
    async fn list_repositories(&self) -> Result<Vec<RepositoryName>, FetchError> {
        if *self.offline.lock() {
            return Err(FetchError::Repositories("snapshot registry is offline".to_string()));
        }
        Ok(self.repositories.lock().keys().cloned().collect())
    }

    async fn list_images(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<ImageRecord>, FetchError> {
        if self.unreachable.lock().contains(repository) {
            return Err(FetchError::Images {
                repository: repository.clone(),
                message: "repository unreachable".to_string(),
            });
        }
        Ok(self.images(repository))
    }
}

#[async_trait]
impl ImageDeleter for SnapshotRegistry {
    async fn delete_batch(
        &self,
        repository: &RepositoryName,
        digests: &[Digest],
    ) -> Result<BatchOutcome, DeleteError> {
        self.batches.lock().push(digests.len());

        let rejected = self.rejected.lock().clone();
        let mut repositories = self.repositories.lock();
        let images = repositories
            .get_mut(repository)
            .ok_or_else(|| DeleteError::RepositoryNotFound(repository.to_string()))?;

        let mut outcome = BatchOutcome::default();
        for digest in digests {
            if rejected.contains(digest) {
                outcome
                    .failures
                    .push(DeletionFailure::new(digest.clone(), "deletion rejected"));
                continue;
            }

            let before = images.len();
            images.retain(|image| image.digest.as_ref() != Some(digest));
            if images.len() < before {
                outcome.deleted.push(digest.clone());
            } else {
                outcome
                    .failures
                    .push(DeletionFailure::new(digest.clone(), "ImageNotFound"));
            }
        }

        Ok(outcome)
    }
}
