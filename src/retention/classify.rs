// ABOUTME: Classification of a repository's images into delete and retain sets.
// ABOUTME: Tracks protect their newest images; untagged and expired unprotected images are deleted.

use super::{ImageRecord, RetentionPolicy};
use crate::types::{Digest, TagPrefix};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Why an image landed where it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    /// No tags at all. Never protected.
    Untagged,
    /// Older than the retention window and not protected by any track.
    Expired,
    /// Among the newest images of `track`.
    Protected { track: TagPrefix },
    /// Tagged, unprotected, and inside the retention window.
    Recent,
}

impl Reason {
    pub fn deletes(&self) -> bool {
        matches!(self, Reason::Untagged | Reason::Expired)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Untagged => write!(f, "untagged"),
            Reason::Expired => write!(f, "expired"),
            Reason::Protected { track } => write!(f, "protected by track '{}'", track),
            Reason::Recent => write!(f, "within retention window"),
        }
    }
}

/// An image together with the rule that decided it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub image: ImageRecord,
    #[serde(flatten)]
    pub reason: Reason,
}

/// Output of one engine invocation. Both lists keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub to_delete: Vec<Decision>,
    pub to_retain: Vec<Decision>,
}

impl ClassificationResult {
    /// Total number of classified images.
    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_retain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_retain.is_empty()
    }

    /// Distinct digests to hand to the deletion executor, in input order.
    ///
    /// Records without a digest cannot be deleted by digest and are skipped.
    pub fn digests_to_delete(&self) -> Vec<Digest> {
        let mut seen = HashSet::new();
        self.to_delete
            .iter()
            .filter_map(|d| d.image.digest.as_ref())
            .filter(|digest| seen.insert(*digest))
            .cloned()
            .collect()
    }

    /// Records marked for deletion that carry no digest.
    pub fn undeletable(&self) -> impl Iterator<Item = &ImageRecord> {
        self.to_delete
            .iter()
            .map(|d| &d.image)
            .filter(|image| image.digest.is_none())
    }
}

/// Digests protected by at least one track, mapped to the first track (in
/// policy order) that protects them.
pub fn protected_digests(
    images: &[ImageRecord],
    policy: &RetentionPolicy,
) -> HashMap<Digest, TagPrefix> {
    let mut protected = HashMap::new();

    for prefix in &policy.tag_prefixes {
        let mut matching: Vec<&ImageRecord> = images
            .iter()
            .filter(|image| prefix.matches_any(&image.tags))
            .collect();

        // sort_by is stable: equal push times keep input order. A digestless
        // image still takes its slot but protects nothing.
        matching.sort_by(|a, b| newest_first(a.pushed_at, b.pushed_at));

        for digest in matching
            .into_iter()
            .take(policy.keep_per_track)
            .filter_map(|image| image.digest.as_ref())
        {
            protected
                .entry(digest.clone())
                .or_insert_with(|| prefix.clone());
        }
    }

    protected
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Partition `images` into delete and retain sets.
///
/// Rules, first match wins:
/// 1. untagged -> delete
/// 2. old and not protected -> delete
/// 3. protected -> retain, even when old
/// 4. anything else -> retain
///
/// Every input image appears in exactly one of the two lists.
pub fn classify(
    images: &[ImageRecord],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> ClassificationResult {
    let protected = protected_digests(images, policy);
    let mut result = ClassificationResult::default();

    for image in images {
        let protected_by = image.digest.as_ref().and_then(|d| protected.get(d));

        let reason = if !image.is_tagged() {
            Reason::Untagged
        } else if let Some(track) = protected_by {
            Reason::Protected {
                track: track.clone(),
            }
        } else if policy.is_old(image, now) {
            Reason::Expired
        } else {
            Reason::Recent
        };

        let decision = Decision {
            image: image.clone(),
            reason,
        };
        if decision.reason.deletes() {
            result.to_delete.push(decision);
        } else {
            result.to_retain.push(decision);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagPrefixes;
    use chrono::Duration;

    fn image(digest: &str, tags: &[&str], days_ago: i64, now: DateTime<Utc>) -> ImageRecord {
        ImageRecord::new(
            Digest::new(digest).unwrap(),
            tags.iter().map(|t| t.to_string()).collect(),
            now - Duration::days(days_ago),
        )
    }

    fn policy(days: u32, prefixes: &str) -> RetentionPolicy {
        RetentionPolicy::new(days, TagPrefixes::parse_list(prefixes).unwrap())
    }

    fn digests(decisions: &[Decision]) -> Vec<&str> {
        decisions
            .iter()
            .map(|d| d.image.digest.as_ref().unwrap().as_str())
            .collect()
    }

    #[test]
    fn old_single_track_image_is_protected() {
        let now = Utc::now();
        let images = vec![image("d1", &["prod-v1"], 40, now)];

        let result = classify(&images, &policy(30, "prod"), now);

        assert!(result.to_delete.is_empty());
        assert_eq!(digests(&result.to_retain), vec!["d1"]);
        assert_eq!(
            result.to_retain[0].reason,
            Reason::Protected {
                track: TagPrefix::new("prod").unwrap()
            }
        );
    }

    #[test]
    fn keeps_two_newest_per_track() {
        let now = Utc::now();
        let images = vec![
            image("v1", &["prod-v1"], 50, now),
            image("v2", &["prod-v2"], 40, now),
            image("v3", &["prod-v3"], 30, now),
        ];

        let result = classify(&images, &policy(20, "prod"), now);

        assert_eq!(digests(&result.to_delete), vec!["v1"]);
        assert_eq!(digests(&result.to_retain), vec!["v2", "v3"]);
    }

    #[test]
    fn untagged_is_deleted_even_when_fresh() {
        let now = Utc::now();
        let images = vec![image("d1", &[], 0, now)];

        let result = classify(&images, &policy(30, "prod"), now);

        assert_eq!(digests(&result.to_delete), vec!["d1"]);
        assert_eq!(result.to_delete[0].reason, Reason::Untagged);
    }

    #[test]
    fn recent_image_outside_tracks_is_retained() {
        let now = Utc::now();
        let images = vec![image("d1", &["staging-x"], 5, now)];

        let result = classify(&images, &policy(30, "prod"), now);

        assert!(result.to_delete.is_empty());
        assert_eq!(result.to_retain[0].reason, Reason::Recent);
    }

    #[test]
    fn image_in_two_tracks_counts_for_both() {
        let now = Utc::now();
        let images = vec![
            image("shared", &["prod-1", "rc-1"], 60, now),
            image("p2", &["prod-2"], 50, now),
            image("p3", &["prod-3"], 40, now),
        ];

        // prod protects p3 and p2; rc protects shared
        let result = classify(&images, &policy(10, "prod,rc"), now);

        assert!(result.to_delete.is_empty());
        assert_eq!(
            result.to_retain[0].reason,
            Reason::Protected {
                track: TagPrefix::new("rc").unwrap()
            }
        );
    }

    #[test]
    fn empty_prefixes_fall_back_to_age() {
        let now = Utc::now();
        let images = vec![
            image("old", &["v1"], 31, now),
            image("new", &["v2"], 1, now),
        ];

        let result = classify(&images, &policy(30, ""), now);

        assert_eq!(digests(&result.to_delete), vec!["old"]);
        assert_eq!(digests(&result.to_retain), vec!["new"]);
    }

    #[test]
    fn ties_resolve_in_input_order() {
        let now = Utc::now();
        let images = vec![
            image("a", &["prod-a"], 40, now),
            image("b", &["prod-b"], 40, now),
            image("c", &["prod-c"], 40, now),
        ];

        let result = classify(&images, &policy(30, "prod"), now);

        assert_eq!(digests(&result.to_retain), vec!["a", "b"]);
        assert_eq!(digests(&result.to_delete), vec!["c"]);
    }

    #[test]
    fn digestless_images_are_classified_but_never_protected() {
        let now = Utc::now();
        let mut orphan = image("x", &["prod-old"], 90, now);
        orphan.digest = None;
        let images = vec![orphan, image("p1", &["prod-1"], 80, now)];

        let result = classify(&images, &policy(30, "prod").with_keep_per_track(1), now);

        assert_eq!(result.to_delete.len(), 1);
        assert!(result.to_delete[0].image.digest.is_none());
        assert_eq!(digests(&result.to_retain), vec!["p1"]);
        assert!(result.digests_to_delete().is_empty());
        assert_eq!(result.undeletable().count(), 1);
    }

    #[test]
    fn digestless_image_uses_up_a_track_slot() {
        let now = Utc::now();
        let mut orphan = image("x", &["prod-3"], 35, now);
        orphan.digest = None;
        let images = vec![
            orphan,
            image("p1", &["prod-2"], 40, now),
            image("p2", &["prod-1"], 50, now),
        ];

        let result = classify(&images, &policy(30, "prod"), now);

        assert_eq!(result.to_delete.len(), 2);
        assert!(result.to_delete[0].image.digest.is_none());
        assert_eq!(result.to_delete[1].image.digest.as_ref().unwrap().as_str(), "p2");
        assert_eq!(digests(&result.to_retain), vec!["p1"]);
        assert_eq!(
            protected_digests(&images, &policy(30, "prod")).len(),
            1
        );
    }

    #[test]
    fn undated_images_rank_last_and_are_not_old() {
        let now = Utc::now();
        let mut undated = image("u", &["prod-u"], 0, now);
        undated.pushed_at = None;
        let images = vec![
            undated,
            image("a", &["prod-a"], 50, now),
            image("b", &["prod-b"], 45, now),
        ];

        let result = classify(&images, &policy(30, "prod"), now);

        let retained = digests(&result.to_retain);
        assert_eq!(retained, vec!["u", "a", "b"]);
        assert_eq!(result.to_retain[0].reason, Reason::Recent);
    }

    #[test]
    fn digests_to_delete_deduplicates() {
        let now = Utc::now();
        let images = vec![image("d", &[], 1, now), image("d", &[], 2, now)];

        let result = classify(&images, &policy(30, ""), now);

        assert_eq!(result.to_delete.len(), 2);
        assert_eq!(result.digests_to_delete().len(), 1);
    }
}
