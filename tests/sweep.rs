// ABOUTME: Integration tests for the sweep driver against the in-memory snapshot registry.
// ABOUTME: Tests dry-run, batching, partial failures, repository filters, and fetch errors.

use chrono::{DateTime, Duration, TimeZone, Utc};
use regprune::diagnostics::WarningKind;
use regprune::registry::{DeletionExecutor, FetchError, SnapshotRegistry};
use regprune::retention::{ImageRecord, RetentionPolicy};
use regprune::sweep::Sweeper;
use regprune::types::{Digest, RepositoryName, TagPrefixes};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn repo(name: &str) -> RepositoryName {
    RepositoryName::new(name).unwrap()
}

fn digest(value: &str) -> Digest {
    Digest::new(value).unwrap()
}

fn image(id: &str, tags: &[&str], days_ago: i64) -> ImageRecord {
    ImageRecord::new(
        digest(id),
        tags.iter().map(|t| t.to_string()).collect(),
        now() - Duration::days(days_ago),
    )
}

fn policy() -> RetentionPolicy {
    RetentionPolicy::new(30, TagPrefixes::parse_list("prod").unwrap())
}

/// `web` has two deletable images, `api` has one, `docs` has none.
fn registry() -> SnapshotRegistry {
    SnapshotRegistry::new()
        .with_repository(
            repo("web"),
            vec![
                image("sha256:w1", &["prod-1"], 90),
                image("sha256:w2", &["prod-2"], 80),
                image("sha256:w3", &["prod-3"], 70),
                image("sha256:w4", &[], 1),
            ],
        )
        .with_repository(
            repo("api"),
            vec![
                image("sha256:a1", &["feature"], 45),
                image("sha256:a2", &["feature"], 2),
            ],
        )
        .with_repository(repo("docs"), vec![image("sha256:d1", &["latest"], 3)])
}

#[tokio::test]
async fn sweep_deletes_only_classified_images() {
    let registry = registry();

    let report = Sweeper::new(&registry, policy(), false)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.repositories.len(), 3);
    assert_eq!(report.deleted_count(), 3);
    assert!(!report.has_failures());

    let web: Vec<Digest> = registry
        .images(&repo("web"))
        .into_iter()
        .filter_map(|i| i.digest)
        .collect();
    assert_eq!(web, vec![digest("sha256:w2"), digest("sha256:w3")]);
    assert_eq!(registry.images(&repo("api")).len(), 1);
    assert_eq!(registry.images(&repo("docs")).len(), 1);
}

#[tokio::test]
async fn repositories_are_reported_in_listing_order() {
    let registry = registry();

    let report = Sweeper::new(&registry, policy(), true)
        .concurrency(3)
        .run(now())
        .await
        .unwrap();

    let names: Vec<&str> = report
        .repositories
        .iter()
        .map(|r| r.repository.as_str())
        .collect();
    assert_eq!(names, ["api", "docs", "web"]);
}

#[tokio::test]
async fn dry_run_leaves_registry_untouched() {
    let registry = registry();

    let report = Sweeper::new(&registry, policy(), true)
        .run(now())
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.deleted_count(), 3);
    assert!(registry.batch_sizes().is_empty());
    assert_eq!(registry.images(&repo("web")).len(), 4);
    assert_eq!(registry.images(&repo("api")).len(), 2);
}

#[tokio::test]
async fn partial_failure_names_digest_and_continues() {
    let registry = registry();
    registry.reject_deletion_of(digest("sha256:a1"));

    let report = Sweeper::new(&registry, policy(), false)
        .run(now())
        .await
        .unwrap();

    assert!(report.has_failures());
    assert_eq!(report.failed_count(), 1);

    let api = &report.repositories[0];
    let failed = api.outcome.partial_failure().unwrap();
    assert_eq!(failed.failed_digests().collect::<Vec<_>>(), [&digest("sha256:a1")]);

    // web comes after api and is still swept
    assert_eq!(registry.images(&repo("web")).len(), 2);
    assert!(
        report
            .diagnostics
            .warnings()
            .iter()
            .any(|w| w.kind == WarningKind::PartialDeletion)
    );
}

#[tokio::test]
async fn batches_never_exceed_limit() {
    let images: Vec<ImageRecord> = (0..250)
        .map(|i| image(&format!("sha256:{i:04}"), &[], 1))
        .collect();
    let registry = SnapshotRegistry::new().with_repository(repo("bulk"), images);

    let report = Sweeper::new(&registry, policy(), false)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.deleted_count(), 250);
    assert_eq!(registry.batch_sizes(), vec![100, 100, 50]);
}

#[tokio::test]
async fn batch_limit_can_be_lowered() {
    let registry = registry();

    Sweeper::new(&registry, policy(), false)
        .batch_limit(1)
        .only(vec![repo("web")])
        .run(now())
        .await
        .unwrap();

    assert_eq!(registry.batch_sizes(), vec![1, 1]);
}

#[tokio::test]
async fn repository_filter_limits_sweep() {
    let registry = registry();

    let report = Sweeper::new(&registry, policy(), false)
        .only(vec![repo("api"), repo("missing")])
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.repositories.len(), 1);
    assert_eq!(report.repositories[0].repository, repo("api"));
    assert_eq!(registry.images(&repo("web")).len(), 4);
    assert!(
        report
            .diagnostics
            .warnings()
            .iter()
            .any(|w| w.kind == WarningKind::UnknownRepository)
    );
}

#[tokio::test]
async fn repository_listing_failure_aborts() {
    let registry = registry();
    registry.set_offline(true);

    let result = Sweeper::new(&registry, policy(), false).run(now()).await;

    assert!(matches!(result, Err(FetchError::Repositories(_))));
    assert!(registry.batch_sizes().is_empty());
}

#[tokio::test]
async fn image_listing_failure_aborts() {
    let registry = registry();
    registry.make_unreachable(repo("docs"));

    let result = Sweeper::new(&registry, policy(), false).run(now()).await;

    assert!(matches!(result, Err(FetchError::Images { .. })));
}

#[tokio::test]
async fn digestless_images_are_reported_as_undeletable() {
    let registry = SnapshotRegistry::from_json(
        r#"{ "repositories": { "web": [ { "tags": [] }, { "digest": "sha256:ok", "tags": [] } ] } }"#,
    )
    .unwrap();

    let report = Sweeper::new(&registry, policy(), false)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.repositories[0].classification.to_delete.len(), 2);
    assert_eq!(report.deleted_count(), 1);
    assert!(
        report
            .diagnostics
            .warnings()
            .iter()
            .any(|w| w.kind == WarningKind::Undeletable)
    );
}

#[tokio::test]
async fn executor_reports_missing_digest_as_failure() {
    let registry = registry();
    let executor = DeletionExecutor::new(&registry, false);

    let outcome = executor
        .execute(&repo("docs"), &[digest("sha256:gone")])
        .await;

    assert_eq!(outcome.deleted_count(), 0);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].reason, "ImageNotFound");
}
