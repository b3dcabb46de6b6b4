//! Export summary and reporting
//!
//! Tracks what a run published and which packages failed. Package failures
//! never abort the run; they are collected here and surfaced at the end.

use crate::domain::{ErrorClass, ExportError, PackageId, Result};
use std::time::Duration;

/// A package whose export was abandoned for this run
#[derive(Debug, Clone)]
pub struct PackageFailure {
    /// Package that was not exported
    pub package_id: PackageId,

    /// Number of attempts made
    pub attempts: u32,

    /// Whether the last error was transient (retries exhausted) or fatal
    pub class: ErrorClass,

    /// Error message of the last attempt
    pub message: String,
}

impl PackageFailure {
    /// Create a failure record from the final error
    pub fn new(package_id: PackageId, attempts: u32, error: &ExportError) -> Self {
        Self {
            package_id,
            attempts,
            class: error.class(),
            message: error.to_string(),
        }
    }
}

/// Summary of an export run
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Aggregate report blobs, in publication order
    pub aggregate_reports: Vec<String>,

    /// Packages in the per-package snapshot
    pub total_packages: usize,

    /// Packages exported (and confirmed, where applicable)
    pub successful_packages: usize,

    /// Packages abandoned after retries or a fatal error
    pub failed_packages: usize,

    /// Export confirmations sent to the warehouse
    pub confirmations: usize,

    /// Attempts beyond the first, across all units of work
    pub retries: u32,

    /// Nothing was uploaded or confirmed
    pub dry_run: bool,

    /// Duration of the run
    pub duration: Duration,

    /// Per-package failures
    pub failures: Vec<PackageFailure>,
}

impl ExportSummary {
    /// Create a new empty summary
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a published aggregate report
    pub fn record_aggregate(&mut self, blob_name: &str, attempts: u32) {
        self.aggregate_reports.push(blob_name.to_string());
        self.retries += attempts.saturating_sub(1);
    }

    /// Record a successful package export
    pub fn record_package_success(&mut self, attempts: u32, confirmed: bool) {
        self.successful_packages += 1;
        if confirmed {
            self.confirmations += 1;
        }
        self.retries += attempts.saturating_sub(1);
    }

    /// Record an abandoned package export
    pub fn record_package_failure(&mut self, failure: PackageFailure) {
        self.failed_packages += 1;
        self.retries += failure.attempts.saturating_sub(1);
        self.failures.push(failure);
    }

    /// True when every package in the snapshot was exported
    pub fn is_successful(&self) -> bool {
        self.failed_packages == 0
    }

    /// Percentage of packages exported
    pub fn success_rate(&self) -> f64 {
        if self.total_packages == 0 {
            return 100.0;
        }
        (self.successful_packages as f64 / self.total_packages as f64) * 100.0
    }

    /// Surface collected package failures as a single error
    pub fn ensure_success(&self) -> Result<()> {
        if self.is_successful() {
            Ok(())
        } else {
            Err(ExportError::BulkExportFailed {
                failed: self.failed_packages,
                total: self.total_packages,
            })
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            aggregate_reports = self.aggregate_reports.len(),
            total_packages = self.total_packages,
            successful = self.successful_packages,
            failed = self.failed_packages,
            confirmations = self.confirmations,
            retries = self.retries,
            dry_run = self.dry_run,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Export completed with failures; affected packages stay pending"
            );
            for failure in &self.failures {
                tracing::warn!(
                    package_id = %failure.package_id,
                    attempts = failure.attempts,
                    class = ?failure.class,
                    message = %failure.message,
                    "Package export failed"
                );
            }
        }
    }
}
