// ABOUTME: Deletion executor: batches digests, honours dry-run, and collects per-digest failures.
// ABOUTME: A failed batch never stops the remaining batches of the same repository.

use super::traits::{DeletionFailure, ImageDeleter};
use crate::types::{Digest, RepositoryName};
use serde::Serialize;
use std::collections::HashSet;

/// Maximum digests per backend call (ECR's `BatchDeleteImage` limit).
pub const BATCH_LIMIT: usize = 100;

/// Runs deletions against an [`ImageDeleter`], or simulates them.
pub struct DeletionExecutor<'a, D> {
    deleter: &'a D,
    dry_run: bool,
    batch_limit: usize,
}

impl<'a, D: ImageDeleter> DeletionExecutor<'a, D> {
    pub fn new(deleter: &'a D, dry_run: bool) -> Self {
        Self {
            deleter,
            dry_run,
            batch_limit: BATCH_LIMIT,
        }
    }

    /// Override the batch size. Values below one are treated as one.
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Delete `digests` from `repository`.
    ///
    /// In dry-run mode nothing is sent to the backend and every requested
    /// digest is reported as deleted.
    pub async fn execute(&self, repository: &RepositoryName, digests: &[Digest]) -> DeletionOutcome {
        let mut outcome = DeletionOutcome {
            repository: repository.clone(),
            requested: digests.len(),
            deleted: Vec::new(),
            failures: Vec::new(),
            dry_run: self.dry_run,
        };

        if digests.is_empty() {
            tracing::info!("No old images to delete in {}", repository);
            return outcome;
        }

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would delete {} image(s) from {}",
                digests.len(),
                repository
            );
            outcome.deleted = digests.to_vec();
            return outcome;
        }

        for batch in digests.chunks(self.batch_limit) {
            match self.deleter.delete_batch(repository, batch).await {
                Ok(result) => {
                    let (deleted, failures) = reconcile(batch, result.deleted, result.failures);
                    outcome.deleted.extend(deleted);
                    outcome.failures.extend(failures);
                }
                Err(e) => {
                    tracing::warn!(
                        "Batch of {} deletion(s) in {} failed: {}",
                        batch.len(),
                        repository,
                        e
                    );
                    outcome.failures.extend(
                        batch
                            .iter()
                            .map(|d| DeletionFailure::new(d.clone(), e.to_string())),
                    );
                }
            }
        }

        tracing::info!(
            "Deleted {} image(s) from {}",
            outcome.deleted.len(),
            repository
        );
        for failure in &outcome.failures {
            tracing::warn!(
                "Failed to delete {} from {}: {}",
                failure.digest,
                repository,
                failure.reason
            );
        }

        outcome
    }
}

/// Restrict a backend response to the requested batch and account for every
/// requested digest exactly once.
fn reconcile(
    requested: &[Digest],
    deleted: Vec<Digest>,
    failures: Vec<DeletionFailure>,
) -> (Vec<Digest>, Vec<DeletionFailure>) {
    let wanted: HashSet<&Digest> = requested.iter().collect();
    let mut seen: HashSet<Digest> = HashSet::new();

    let mut failed: Vec<DeletionFailure> = Vec::new();
    for failure in failures {
        if wanted.contains(&failure.digest) && seen.insert(failure.digest.clone()) {
            failed.push(failure);
        }
    }

    let mut confirmed: Vec<Digest> = Vec::new();
    for digest in deleted {
        if wanted.contains(&digest) && seen.insert(digest.clone()) {
            confirmed.push(digest);
        }
    }

    for digest in requested {
        if seen.insert(digest.clone()) {
            failed.push(DeletionFailure::new(
                digest.clone(),
                "not reported by registry",
            ));
        }
    }

    (confirmed, failed)
}

/// Per-repository result of [`DeletionExecutor::execute`].
#[derive(Debug, Clone, Serialize)]
pub struct DeletionOutcome {
    pub repository: RepositoryName,
    pub requested: usize,
    pub deleted: Vec<Digest>,
    pub failures: Vec<DeletionFailure>,
    pub dry_run: bool,
}

impl DeletionOutcome {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failed subset, if any digest could not be deleted.
    pub fn partial_failure(&self) -> Option<PartialDeletionError> {
        if self.is_complete() {
            return None;
        }
        Some(PartialDeletionError {
            repository: self.repository.clone(),
            requested: self.requested,
            failed: self.failures.clone(),
        })
    }
}

/// Some, but possibly not all, requested digests failed to delete.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} of {} deletion(s) failed in {}", .failed.len(), .requested, .repository)]
pub struct PartialDeletionError {
    pub repository: RepositoryName,
    pub requested: usize,
    pub failed: Vec<DeletionFailure>,
}

impl PartialDeletionError {
    pub fn failed_digests(&self) -> impl Iterator<Item = &Digest> {
        self.failed.iter().map(|f| &f.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(s: &str) -> Digest {
        Digest::new(s).unwrap()
    }

    #[test]
    fn reconcile_fills_in_unreported_digests() {
        let requested = vec![digest("a"), digest("b"), digest("c")];
        let (deleted, failed) = reconcile(
            &requested,
            vec![digest("a"), digest("a")],
            vec![DeletionFailure::new(digest("b"), "ImageNotFound")],
        );

        assert_eq!(deleted, vec![digest("a")]);
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].reason, "ImageNotFound");
        assert_eq!(failed[1].digest, digest("c"));
    }

    #[test]
    fn reconcile_ignores_digests_outside_batch() {
        let requested = vec![digest("a")];
        let (deleted, failed) = reconcile(&requested, vec![digest("a"), digest("z")], vec![]);

        assert_eq!(deleted, vec![digest("a")]);
        assert!(failed.is_empty());
    }

    #[test]
    fn failure_wins_over_deleted_report() {
        let requested = vec![digest("a")];
        let (deleted, failed) = reconcile(
            &requested,
            vec![digest("a")],
            vec![DeletionFailure::new(digest("a"), "in use")],
        );

        assert!(deleted.is_empty());
        assert_eq!(failed.len(), 1);
    }
}
