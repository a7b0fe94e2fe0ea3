// ABOUTME: Registry access: inventory listing, batched deletion, and the concrete backends.
// ABOUTME: Backends are ECR, the local Docker/Podman image store, and an in-memory snapshot.

mod backend;
mod detection;
mod ecr;
mod engine;
mod error;
mod executor;
mod snapshot;
pub mod traits;

pub use backend::Backend;
pub use detection::{DetectionError, EngineConfig, EngineInfo, EngineType, detect_engine};
pub use ecr::EcrRegistry;
pub use engine::EngineRegistry;
pub use error::{BackendError, BackendErrorKind};
pub use executor::{BATCH_LIMIT, DeletionExecutor, DeletionOutcome, PartialDeletionError};
pub use snapshot::SnapshotRegistry;
pub use traits::{
    BatchOutcome, DeleteError, DeletionFailure, FetchError, ImageDeleter, Inventory, Registry,
};
