// ABOUTME: Output formatting for CLI feedback and sweep reports.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::registry::{DeletionFailure, DeletionOutcome};
use crate::retention::Decision;
use crate::sweep::{RepositoryReport, SweepReport};
use crate::types::{Digest, RepositoryName};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with the full per-image report
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                emit(&JsonEvent {
                    event: "success",
                    message,
                    duration_secs: self.duration(),
                });
            }
        }
    }

    /// Print a warning (stderr in human modes).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => emit(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Render one repository's classification and deletion outcome.
    pub fn repository(&self, report: &RepositoryReport) {
        match self.mode {
            OutputMode::Quiet => {}
            OutputMode::Normal => {
                let c = &report.classification;
                println!("Repository: {}", report.repository);
                println!("  Images to be deleted ({}):", c.to_delete.len());
                for decision in &c.to_delete {
                    println!("    {}", describe(decision));
                }
                println!("  Images to be retained ({}):", c.to_retain.len());
                for decision in &c.to_retain {
                    println!("    {}", describe(decision));
                }
                println!("  {}", outcome_line(&report.outcome));
                for failure in &report.outcome.failures {
                    println!("    Failed: {} ({})", failure.digest, failure.reason);
                }
            }
            OutputMode::Json => emit(&JsonRepository {
                event: "repository",
                repository: &report.repository,
                to_delete: &report.classification.to_delete,
                to_retain: &report.classification.to_retain,
                dry_run: report.outcome.dry_run,
                deleted: &report.outcome.deleted,
                failures: &report.outcome.failures,
            }),
        }
    }

    /// Render the totals of a sweep.
    pub fn summary(&self, report: &SweepReport) {
        let message = format!(
            "{}{} deleted, {} retained, {} failed across {} repositories",
            if report.dry_run { "[DRY-RUN] " } else { "" },
            report.deleted_count(),
            report.retained_count(),
            report.failed_count(),
            report.repositories.len()
        );

        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => self.success(&message),
            OutputMode::Json => emit(&JsonSummary {
                event: "summary",
                dry_run: report.dry_run,
                repositories: report.repositories.len(),
                deleted: report.deleted_count(),
                retained: report.retained_count(),
                failed: report.failed_count(),
                duration_secs: self.duration(),
            }),
        }
    }

    /// Render one line of the `repos` listing.
    pub fn repository_entry(&self, repository: &RepositoryName, images: usize) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{repository}\t{images}"),
            OutputMode::Json => emit(&JsonRepositoryEntry {
                event: "repository",
                repository,
                images,
            }),
        }
    }
}

fn describe(decision: &Decision) -> String {
    format!("{} [{}]", decision.image, decision.reason)
}

fn outcome_line(outcome: &DeletionOutcome) -> String {
    if outcome.requested == 0 {
        format!("No old images to delete in {}", outcome.repository)
    } else if outcome.dry_run {
        format!(
            "[DRY-RUN] Would delete {} image(s) from {}",
            outcome.requested, outcome.repository
        )
    } else {
        format!(
            "Deleted {} of {} image(s) from {}",
            outcome.deleted_count(),
            outcome.requested,
            outcome.repository
        )
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonRepository<'a> {
    event: &'a str,
    repository: &'a RepositoryName,
    to_delete: &'a [Decision],
    to_retain: &'a [Decision],
    dry_run: bool,
    deleted: &'a [Digest],
    failures: &'a [DeletionFailure],
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    event: &'a str,
    dry_run: bool,
    repositories: usize,
    deleted: usize,
    retained: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonRepositoryEntry<'a> {
    event: &'a str,
    repository: &'a RepositoryName,
    images: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(requested: usize, deleted: usize, dry_run: bool) -> DeletionOutcome {
        DeletionOutcome {
            repository: RepositoryName::new("web").unwrap(),
            requested,
            deleted: (0..deleted)
                .map(|i| Digest::new(&format!("sha256:{i}")).unwrap())
                .collect(),
            failures: vec![],
            dry_run,
        }
    }

    #[test]
    fn outcome_line_for_empty_request() {
        assert_eq!(
            outcome_line(&outcome(0, 0, false)),
            "No old images to delete in web"
        );
    }

    #[test]
    fn outcome_line_for_dry_run() {
        assert_eq!(
            outcome_line(&outcome(3, 3, true)),
            "[DRY-RUN] Would delete 3 image(s) from web"
        );
    }

    #[test]
    fn outcome_line_for_partial_delete() {
        assert_eq!(
            outcome_line(&outcome(3, 2, false)),
            "Deleted 2 of 3 image(s) from web"
        );
    }
}
