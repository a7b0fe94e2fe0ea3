// ABOUTME: Diagnostics accumulator for non-fatal problems during a sweep.
// ABOUTME: Collects warnings that shouldn't stop the run but should be shown to users.

use crate::registry::PartialDeletionError;
use crate::types::RepositoryName;

/// Collects non-fatal warnings during a sweep.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any deletion failed.
    pub fn has_failed_deletions(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.kind == WarningKind::PartialDeletion)
    }
}

/// A non-fatal warning collected during a sweep.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub repository: Option<RepositoryName>,
    pub message: String,
}

impl Warning {
    /// Some digests of a repository could not be deleted.
    pub fn partial_deletion(error: &PartialDeletionError) -> Self {
        let digests: Vec<&str> = error.failed_digests().map(|d| d.as_str()).collect();
        Self {
            kind: WarningKind::PartialDeletion,
            repository: Some(error.repository.clone()),
            message: format!("{}: {}", error, digests.join(", ")),
        }
    }

    /// Images marked for deletion that have no digest to delete by.
    pub fn undeletable(repository: &RepositoryName, count: usize) -> Self {
        Self {
            kind: WarningKind::Undeletable,
            repository: Some(repository.clone()),
            message: format!(
                "{} image(s) in {} have no digest and cannot be deleted",
                count, repository
            ),
        }
    }

    /// A repository named in the configuration does not exist.
    pub fn unknown_repository(repository: &RepositoryName) -> Self {
        Self {
            kind: WarningKind::UnknownRepository,
            repository: Some(repository.clone()),
            message: format!("repository {} not found in registry", repository),
        }
    }
}

/// Categories of warnings that can occur during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Some digests failed to delete.
    PartialDeletion,
    /// Deletion candidates without a digest.
    Undeletable,
    /// Configured repository missing from the registry.
    UnknownRepository,
}
