// ABOUTME: Tag prefixes that define retention tracks.
// ABOUTME: Parses the comma-separated list form and collapses duplicates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagPrefixError {
    #[error("tag prefix cannot be empty")]
    Empty,

    #[error("empty entry at position {0} in tag prefix list")]
    EmptyEntry(usize),
}

/// A literal tag prefix, e.g. `prod` matches `prod-v1` and `production`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TagPrefix(String);

impl TagPrefix {
    pub fn new(value: &str) -> Result<Self, TagPrefixError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TagPrefixError::Empty);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Literal prefix test on the full tag string.
    pub fn matches(&self, tag: &str) -> bool {
        tag.starts_with(&self.0)
    }

    /// True when any of `tags` falls in this track.
    pub fn matches_any(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.matches(t))
    }
}

impl fmt::Display for TagPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, duplicate-free set of tag prefixes. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPrefixes(Vec<TagPrefix>);

impl TagPrefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prefix, ignoring it if already present.
    pub fn insert(&mut self, prefix: TagPrefix) {
        if !self.0.contains(&prefix) {
            self.0.push(prefix);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagPrefix> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a comma-separated list such as `"prod, staging"`.
    ///
    /// Entries are trimmed; an entry that is empty after trimming is an error.
    /// An input that is blank as a whole yields an empty set.
    pub fn parse_list(input: &str) -> Result<Self, TagPrefixError> {
        let mut prefixes = Self::new();
        if input.trim().is_empty() {
            return Ok(prefixes);
        }

        for (index, entry) in input.split(',').enumerate() {
            let prefix = TagPrefix::new(entry).map_err(|_| TagPrefixError::EmptyEntry(index))?;
            prefixes.insert(prefix);
        }

        Ok(prefixes)
    }
}

impl FromStr for TagPrefixes {
    type Err = TagPrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_list(s)
    }
}

impl FromIterator<TagPrefix> for TagPrefixes {
    fn from_iter<I: IntoIterator<Item = TagPrefix>>(iter: I) -> Self {
        let mut prefixes = Self::new();
        for prefix in iter {
            prefixes.insert(prefix);
        }
        prefixes
    }
}

impl<'a> IntoIterator for &'a TagPrefixes {
    type Item = &'a TagPrefix;
    type IntoIter = std::slice::Iter<'a, TagPrefix>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TagPrefixes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(TagPrefix::as_str).collect();
        write!(f, "{}", joined.join(","))
    }
}

impl Serialize for TagPrefixes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values: Vec<&str> = self.0.iter().map(TagPrefix::as_str).collect();
        values.serialize(serializer)
    }
}

/// Accepts either a YAML list or the comma-separated string form.
impl<'de> Deserialize<'de> for TagPrefixes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Joined(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Joined(s) => Self::parse_list(&s).map_err(serde::de::Error::custom),
            Raw::List(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| TagPrefix::new(v).map_err(|_| TagPrefixError::EmptyEntry(i)))
                .collect::<Result<TagPrefixes, _>>()
                .map_err(serde::de::Error::custom),
        }
    }
}
