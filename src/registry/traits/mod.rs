// ABOUTME: Capability traits implemented by registry backends.
// ABOUTME: Defines Inventory, ImageDeleter, and the combined Registry bound.

mod deleter;
mod inventory;
pub(crate) mod sealed;

pub use deleter::{BatchOutcome, DeleteError, DeletionFailure, ImageDeleter};
pub use inventory::{FetchError, Inventory};

/// A backend that can both list and delete images.
///
/// Automatically implemented for any type implementing both capabilities.
pub trait Registry: Inventory + ImageDeleter {}

impl<T: Inventory + ImageDeleter> Registry for T {}
