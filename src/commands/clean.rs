// ABOUTME: Clean command implementation.
// ABOUTME: Runs one sweep with the resolved settings and renders the report.

use super::backend::connect_backend;
use chrono::Utc;
use regprune::config::CleanupSettings;
use regprune::error::{Error, Result};
use regprune::output::Output;
use regprune::sweep::Sweeper;

/// Sweep the configured registry.
///
/// Returns `Error::DeletionsFailed` after the full report is printed when
/// any deletion failed.
pub async fn clean(settings: CleanupSettings, mut output: Output) -> Result<()> {
    output.start_timer();

    let registry = connect_backend(&settings.backend, &output).await?;
    if settings.dry_run {
        output.progress("[DRY-RUN] No images will be deleted");
    }

    let sweeper = Sweeper::new(&registry, settings.policy, settings.dry_run)
        .only(settings.repositories)
        .concurrency(settings.concurrency);

    let report = sweeper.run(Utc::now()).await.inspect_err(|e| {
        if e.is_throttled() {
            output.warning("registry is throttling requests; retry later or lower --concurrency");
        }
    })?;

    for repository in &report.repositories {
        output.repository(repository);
    }
    for warning in report.diagnostics.warnings() {
        output.warning(&warning.message);
    }
    output.summary(&report);

    if report.has_failures() {
        return Err(Error::DeletionsFailed(report.failed_count()));
    }
    Ok(())
}
