// ABOUTME: Sweep driver: lists repositories, classifies their images, and runs deletions.
// ABOUTME: Repositories are independent; partial deletion failures never stop the sweep.

use crate::diagnostics::{Diagnostics, Warning};
use crate::registry::{DeletionExecutor, DeletionOutcome, FetchError, Registry};
use crate::retention::{ClassificationResult, RetentionPolicy, classify};
use crate::types::RepositoryName;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt, stream};

/// Result of sweeping one repository.
#[derive(Debug, Clone)]
pub struct RepositoryReport {
    pub repository: RepositoryName,
    pub classification: ClassificationResult,
    pub outcome: DeletionOutcome,
}

/// Result of a whole sweep.
#[derive(Debug)]
pub struct SweepReport {
    pub now: DateTime<Utc>,
    pub dry_run: bool,
    pub repositories: Vec<RepositoryReport>,
    pub diagnostics: Diagnostics,
}

impl SweepReport {
    pub fn deleted_count(&self) -> usize {
        self.repositories
            .iter()
            .map(|r| r.outcome.deleted_count())
            .sum()
    }

    pub fn retained_count(&self) -> usize {
        self.repositories
            .iter()
            .map(|r| r.classification.to_retain.len())
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        self.repositories
            .iter()
            .map(|r| r.outcome.failures.len())
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.diagnostics.has_failed_deletions()
    }
}

/// Runs the retention policy across a registry.
pub struct Sweeper<'a, R> {
    registry: &'a R,
    executor: DeletionExecutor<'a, R>,
    policy: RetentionPolicy,
    only: Vec<RepositoryName>,
    concurrency: usize,
}

impl<'a, R: Registry> Sweeper<'a, R> {
    pub fn new(registry: &'a R, policy: RetentionPolicy, dry_run: bool) -> Self {
        Self {
            registry,
            executor: DeletionExecutor::new(registry, dry_run),
            policy,
            only: Vec::new(),
            concurrency: 1,
        }
    }

    /// Restrict the sweep to these repositories. Empty means all.
    pub fn only(mut self, repositories: Vec<RepositoryName>) -> Self {
        self.only = repositories;
        self
    }

    /// Number of repositories processed at once. Values below one mean one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn batch_limit(mut self, limit: usize) -> Self {
        self.executor = self.executor.with_batch_limit(limit);
        self
    }

    /// Sweep every selected repository, using `now` as the age reference.
    ///
    /// Listing failures abort the sweep. Deletion failures are collected in
    /// the report's diagnostics.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport, FetchError> {
        let mut diagnostics = Diagnostics::default();

        let available = self.registry.list_repositories().await?;
        let names: Vec<&str> = available.iter().map(RepositoryName::as_str).collect();
        tracing::info!("Found repositories: {}", names.join(", "));

        let selected: Vec<RepositoryName> = if self.only.is_empty() {
            available
        } else {
            for wanted in &self.only {
                if !available.contains(wanted) {
                    diagnostics.warn(Warning::unknown_repository(wanted));
                }
            }
            available
                .into_iter()
                .filter(|r| self.only.contains(r))
                .collect()
        };

        let repositories: Vec<RepositoryReport> = stream::iter(selected)
            .map(|repository| self.sweep_repository(repository, now))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        for report in &repositories {
            let undeletable = report.classification.undeletable().count();
            if undeletable > 0 {
                diagnostics.warn(Warning::undeletable(&report.repository, undeletable));
            }
            if let Some(error) = report.outcome.partial_failure() {
                diagnostics.warn(Warning::partial_deletion(&error));
            }
        }

        tracing::info!("Cleanup process completed.");

        Ok(SweepReport {
            now,
            dry_run: self.executor.is_dry_run(),
            repositories,
            diagnostics,
        })
    }

    /// List, classify, and delete within a single repository.
    pub async fn sweep_repository(
        &self,
        repository: RepositoryName,
        now: DateTime<Utc>,
    ) -> Result<RepositoryReport, FetchError> {
        tracing::info!("Checking repository: {}", repository);

        let images = self.registry.list_images(&repository).await?;
        let classification = classify(&images, &self.policy, now);

        tracing::info!("Images to be deleted ({}):", classification.to_delete.len());
        for decision in &classification.to_delete {
            tracing::info!(" {} ({})", decision.image, decision.reason);
        }
        tracing::info!("Images to be retained ({}):", classification.to_retain.len());
        for decision in &classification.to_retain {
            tracing::info!(" {} ({})", decision.image, decision.reason);
        }

        let digests = classification.digests_to_delete();
        let outcome = self.executor.execute(&repository, &digests).await;

        Ok(RepositoryReport {
            repository,
            classification,
            outcome,
        })
    }
}
