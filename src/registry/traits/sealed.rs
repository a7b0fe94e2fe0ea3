// ABOUTME: Sealed trait pattern for registry traits.
// ABOUTME: Only backends defined in this crate may implement Inventory and ImageDeleter.

/// Sealed trait to prevent external implementations.
///
/// New methods can be added to the registry traits without breaking
/// downstream code, since only this crate's backends implement them.
pub trait Sealed {}
