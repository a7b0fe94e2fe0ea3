// ABOUTME: Retention policy parameters for one run.
// ABOUTME: Retention window, tag-prefix tracks, and how many images each track protects.

use super::ImageRecord;
use crate::types::TagPrefixes;
use chrono::{DateTime, Duration, Utc};

/// Number of most recent images each track protects from age-based deletion.
pub const KEEP_PER_TRACK: usize = 2;

/// Run parameters for the retention engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Images pushed before `now - retention_days` are old.
    pub retention_days: u32,
    /// Tracks, each protecting its most recent images.
    pub tag_prefixes: TagPrefixes,
    /// How many images each track protects.
    pub keep_per_track: usize,
}

impl RetentionPolicy {
    pub fn new(retention_days: u32, tag_prefixes: TagPrefixes) -> Self {
        Self {
            retention_days,
            tag_prefixes,
            keep_per_track: KEEP_PER_TRACK,
        }
    }

    pub fn with_keep_per_track(mut self, keep: usize) -> Self {
        self.keep_per_track = keep;
        self
    }

    /// Cutoff instant; anything pushed strictly before it is old.
    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.retention_days))
    }

    /// Whether `image` is older than the retention window.
    ///
    /// An image with no push time is never old.
    pub fn is_old(&self, image: &ImageRecord, now: DateTime<Utc>) -> bool {
        let threshold = self.threshold(now);
        image.pushed_at.is_some_and(|pushed| pushed < threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Digest;

    fn image_at(pushed_at: DateTime<Utc>) -> ImageRecord {
        ImageRecord::new(Digest::new("sha256:a").unwrap(), vec!["v1".into()], pushed_at)
    }

    #[test]
    fn default_keep_is_named_constant() {
        let policy = RetentionPolicy::new(30, TagPrefixes::new());
        assert_eq!(policy.keep_per_track, KEEP_PER_TRACK);
        assert_eq!(policy.with_keep_per_track(5).keep_per_track, 5);
    }

    #[test]
    fn zero_days_threshold_is_now() {
        let now = Utc::now();
        let policy = RetentionPolicy::new(0, TagPrefixes::new());
        assert_eq!(policy.threshold(now), now);
        assert!(!policy.is_old(&image_at(now), now));
        assert!(policy.is_old(&image_at(now - Duration::seconds(1)), now));
    }

    #[test]
    fn missing_push_time_is_not_old() {
        let now = Utc::now();
        let policy = RetentionPolicy::new(0, TagPrefixes::new());
        let mut image = image_at(now);
        image.pushed_at = None;
        assert!(!policy.is_old(&image, now));
    }
}
