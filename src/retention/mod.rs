// ABOUTME: Retention decision engine: partitions a repository's images into delete and keep sets.
// ABOUTME: Pure and synchronous; the current time is supplied by the caller.

mod classify;
mod image;
mod policy;

pub use classify::{ClassificationResult, Decision, Reason, classify, protected_digests};
pub use image::ImageRecord;
pub use policy::{KEEP_PER_TRACK, RetentionPolicy};
