// ABOUTME: Runtime-selected registry backend.
// ABOUTME: Delegates the registry traits to whichever concrete backend was configured.

use super::traits::sealed::Sealed;
use super::traits::{BatchOutcome, DeleteError, FetchError, ImageDeleter, Inventory};
use super::{EcrRegistry, EngineRegistry, SnapshotRegistry};
use crate::retention::ImageRecord;
use crate::types::{Digest, RepositoryName};
use async_trait::async_trait;

/// One of the supported registries, chosen at startup.
pub enum Backend {
    Ecr(EcrRegistry),
    Engine(EngineRegistry),
    Snapshot(SnapshotRegistry),
}

impl Sealed for Backend {}

#[async_trait]
impl Inventory for Backend {
    async fn list_repositories(&self) -> Result<Vec<RepositoryName>, FetchError> {
        match self {
            Backend::Ecr(r) => r.list_repositories().await,
            Backend::Engine(r) => r.list_repositories().await,
            Backend::Snapshot(r) => r.list_repositories().await,
        }
    }

    async fn list_images(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<ImageRecord>, FetchError> {
        match self {
            Backend::Ecr(r) => r.list_images(repository).await,
            Backend::Engine(r) => r.list_images(repository).await,
            Backend::Snapshot(r) => r.list_images(repository).await,
        }
    }
}

#[async_trait]
impl ImageDeleter for Backend {
    async fn delete_batch(
        &self,
        repository: &RepositoryName,
        digests: &[Digest],
    ) -> Result<BatchOutcome, DeleteError> {
        match self {
            Backend::Ecr(r) => r.delete_batch(repository, digests).await,
            Backend::Engine(r) => r.delete_batch(repository, digests).await,
            Backend::Snapshot(r) => r.delete_batch(repository, digests).await,
        }
    }
}
