// ABOUTME: Integration tests for the retention decision engine.
// ABOUTME: Covers the documented scenarios and property tests for the classification rules.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use regprune::retention::{ImageRecord, Reason, RetentionPolicy, classify, protected_digests};
use regprune::types::{Digest, TagPrefix, TagPrefixes};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn image(digest: &str, tags: &[&str], days_ago: i64) -> ImageRecord {
    ImageRecord::new(
        Digest::new(digest).unwrap(),
        tags.iter().map(|t| t.to_string()).collect(),
        now() - Duration::days(days_ago),
    )
}

fn policy(days: u32, prefixes: &str) -> RetentionPolicy {
    RetentionPolicy::new(days, TagPrefixes::parse_list(prefixes).unwrap())
}

fn digests_of(decisions: &[regprune::retention::Decision]) -> Vec<String> {
    decisions
        .iter()
        .map(|d| d.image.digest.as_ref().unwrap().to_string())
        .collect()
}

mod scenarios {
    use super::*;

    #[test]
    fn old_images_beyond_track_cap_are_deleted() {
        let images = vec![
            image("sha256:d1", &["prod-1"], 60),
            image("sha256:d2", &["prod-2"], 50),
            image("sha256:d3", &["prod-3"], 40),
            image("sha256:d4", &["prod-4"], 5),
        ];

        let result = classify(&images, &policy(30, "prod"), now());

        assert_eq!(digests_of(&result.to_delete), ["sha256:d1", "sha256:d2"]);
        assert_eq!(digests_of(&result.to_retain), ["sha256:d3", "sha256:d4"]);
    }

    #[test]
    fn untagged_image_is_deleted_even_when_fresh() {
        let images = vec![image("sha256:u", &[], 1)];

        let result = classify(&images, &policy(30, "prod"), now());

        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_delete[0].reason, Reason::Untagged);
        assert!(result.to_retain.is_empty());
    }

    #[test]
    fn protection_overrides_age() {
        let images = vec![
            image("sha256:p1", &["prod-a"], 400),
            image("sha256:p2", &["prod-b"], 300),
        ];

        let result = classify(&images, &policy(30, "prod"), now());

        assert!(result.to_delete.is_empty());
        assert!(
            result
                .to_retain
                .iter()
                .all(|d| matches!(d.reason, Reason::Protected { .. }))
        );
    }

    #[test]
    fn image_outside_every_track_follows_age_alone() {
        let images = vec![
            image("sha256:f1", &["feature-x"], 45),
            image("sha256:f2", &["feature-y"], 10),
        ];

        let result = classify(&images, &policy(30, "prod"), now());

        assert_eq!(digests_of(&result.to_delete), ["sha256:f1"]);
        assert_eq!(result.to_delete[0].reason, Reason::Expired);
        assert_eq!(digests_of(&result.to_retain), ["sha256:f2"]);
        assert_eq!(result.to_retain[0].reason, Reason::Recent);
    }

    #[test]
    fn zero_day_retention_keeps_only_protected() {
        let images = vec![
            image("sha256:a", &["prod-1"], 3),
            image("sha256:b", &["prod-2"], 2),
            image("sha256:c", &["prod-3"], 1),
            image("sha256:d", &["dev-1"], 1),
        ];

        let result = classify(&images, &policy(0, "prod"), now());

        assert_eq!(digests_of(&result.to_delete), ["sha256:a", "sha256:d"]);
        assert_eq!(digests_of(&result.to_retain), ["sha256:b", "sha256:c"]);
    }

    #[test]
    fn image_matching_two_tracks_is_kept_once() {
        let images = vec![
            image("sha256:m", &["prod-9", "staging-9"], 90),
            image("sha256:s", &["staging-1"], 80),
        ];

        let result = classify(&images, &policy(30, "prod,staging"), now());

        assert!(result.to_delete.is_empty());
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.to_retain[0].reason,
            Reason::Protected {
                track: TagPrefix::new("prod").unwrap()
            }
        );
    }

    #[test]
    fn image_on_the_threshold_is_not_old() {
        let images = vec![image("sha256:edge", &["dev"], 30)];

        let result = classify(&images, &policy(30, ""), now());

        assert!(result.to_delete.is_empty());
    }

    #[test]
    fn deleting_shared_digest_is_requested_once() {
        let images = vec![
            image("sha256:dup", &["old-1"], 90),
            image("sha256:dup", &["old-2"], 90),
        ];

        let result = classify(&images, &policy(30, ""), now());

        assert_eq!(result.to_delete.len(), 2);
        assert_eq!(result.digests_to_delete().len(), 1);
    }
}

fn arb_image() -> impl Strategy<Value = ImageRecord> {
    (
        0u8..12,
        prop::collection::vec(prop::sample::select(vec!["prod-1", "prod-2", "rc-1", "dev"]), 0..3),
        0i64..120,
    )
        .prop_map(|(id, tags, days)| image(&format!("sha256:{id:02x}"), &tags, days))
}

proptest! {
    #[test]
    fn every_image_lands_in_exactly_one_set(
        images in prop::collection::vec(arb_image(), 0..30),
        days in 0u32..90,
    ) {
        let result = classify(&images, &policy(days, "prod,rc"), now());

        prop_assert_eq!(result.len(), images.len());
        let mut all: Vec<ImageRecord> = result
            .to_delete
            .iter()
            .chain(result.to_retain.iter())
            .map(|d| d.image.clone())
            .collect();
        let mut expected = images.clone();
        all.sort_by_key(|i| format!("{i}"));
        expected.sort_by_key(|i| format!("{i}"));
        prop_assert_eq!(all, expected);
    }

    #[test]
    fn untagged_images_are_always_deleted(
        images in prop::collection::vec(arb_image(), 0..30),
    ) {
        let result = classify(&images, &policy(30, "prod,rc"), now());

        prop_assert!(result.to_retain.iter().all(|d| d.image.is_tagged()));
    }

    #[test]
    fn each_track_protects_at_most_its_cap(
        images in prop::collection::vec(arb_image(), 0..30),
        keep in 0usize..4,
    ) {
        for prefix in ["prod", "rc"] {
            let policy = policy(0, prefix).with_keep_per_track(keep);
            let protected = protected_digests(&images, &policy);

            prop_assert!(protected.len() <= keep);
            let track = TagPrefix::new(prefix).unwrap();
            prop_assert!(protected.values().all(|t| *t == track));
        }
    }

    #[test]
    fn classification_is_deterministic(
        images in prop::collection::vec(arb_image(), 0..30),
        days in 0u32..90,
    ) {
        let policy = policy(days, "prod,rc");

        prop_assert_eq!(
            classify(&images, &policy, now()),
            classify(&images, &policy, now())
        );
    }
}
