//! Logging and observability
//!
//! Structured logging through `tracing`, set up by [`init_logging`]. The
//! macros below keep the field names of recurring events consistent so the
//! JSON log can be queried by `blob`, `package_id` or `attempt`.
//!
//! # Example
//!
//! ```no_run
//! use popstats::logging::init_logging;
//! use popstats::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(blob = "permonth.json", "Report published");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a published (or, in dry run, encoded) report
///
/// # Example
///
/// ```no_run
/// use popstats::log_report_published;
///
/// log_report_published!("permonth.json", 120, 4096, false);
/// ```
#[macro_export]
macro_rules! log_report_published {
    ($blob:expr, $rows:expr, $bytes:expr, $dry_run:expr) => {
        if $dry_run {
            tracing::info!(
                blob = %$blob,
                rows = $rows,
                bytes = $bytes,
                "Dry run: report encoded, upload skipped"
            );
        } else {
            tracing::info!(
                blob = %$blob,
                rows = $rows,
                bytes = $bytes,
                "Report published"
            );
        }
    };
}

/// Log progress through the per-package phase
///
/// # Example
///
/// ```no_run
/// use popstats::log_package_progress;
///
/// log_package_progress!("Foo.Bar", 3, 10, true);
/// ```
#[macro_export]
macro_rules! log_package_progress {
    ($package_id:expr, $completed:expr, $total:expr, $succeeded:expr) => {
        tracing::info!(
            package_id = %$package_id,
            completed = $completed,
            total = $total,
            succeeded = $succeeded,
            progress_pct = ($completed as f64 / $total as f64 * 100.0),
            "Package export finished"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use popstats::log_retry_attempt;
/// use std::time::Duration;
///
/// log_retry_attempt!("package Foo.Bar", 2, 10, Duration::from_secs(20), "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay:expr, $reason:expr) => {
        tracing::warn!(
            operation = %$operation,
            attempt = $attempt,
            attempts_remaining = $max_attempts - $attempt,
            delay_secs = $delay.as_secs(),
            reason = %$reason,
            "Retrying operation"
        );
    };
}
