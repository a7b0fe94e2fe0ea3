// ABOUTME: Image record as reported by an inventory backend.
// ABOUTME: Digest and push time are optional because registries do not always report them.

use crate::types::Digest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One image instance in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub digest: Option<Digest>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

impl ImageRecord {
    pub fn new(digest: Digest, tags: Vec<String>, pushed_at: DateTime<Utc>) -> Self {
        Self {
            digest: Some(digest),
            tags,
            pushed_at: Some(pushed_at),
        }
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Tags joined for display, or `Untagged`.
    pub fn tags_label(&self) -> String {
        if self.tags.is_empty() {
            "Untagged".to_string()
        } else {
            self.tags.join(",")
        }
    }
}

impl fmt::Display for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digest = self.digest.as_ref().map(Digest::as_str).unwrap_or("<none>");
        let pushed = self
            .pushed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "Digest: {}, Tags: {}, PushedAt: {}",
            digest,
            self.tags_label(),
            pushed
        )
    }
}
