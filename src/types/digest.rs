// ABOUTME: Opaque image digest identifying one image within a repository.
// ABOUTME: Rejects empty values; otherwise the registry's format is passed through untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("image digest cannot be empty")]
    Empty,

    #[error("invalid character in image digest: {0:?}")]
    InvalidChar(char),
}

/// Image digest, e.g. `sha256:4f1c...`.
///
/// Registries differ in what they hand back (ECR returns manifest digests,
/// a local engine returns image IDs), so only emptiness and whitespace are
/// rejected.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    pub fn new(value: &str) -> Result<Self, DigestError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DigestError::Empty);
        }

        if let Some(c) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(DigestError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    /// Parse an optional registry field, dropping empty or malformed values.
    pub fn parse_optional(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| Self::new(v).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Digest").field(&self.0).finish()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
