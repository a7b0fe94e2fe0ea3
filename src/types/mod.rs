// ABOUTME: Validated domain types shared by the engine and the backends.
// ABOUTME: Digests, repository names, and tag-prefix tracks.

mod digest;
mod repository_name;
mod tag_prefix;

pub use digest::{Digest, DigestError};
pub use repository_name::{RepositoryName, RepositoryNameError};
pub use tag_prefix::{TagPrefix, TagPrefixError, TagPrefixes};
