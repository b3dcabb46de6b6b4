//! Domain error types
//!
//! This module defines the error hierarchy for popstats. Every error carries a
//! classification (see [`ErrorClass`]) which decides whether the retry executor
//! may try the failed unit of work again. Third-party error types are converted
//! to strings at the adapter boundary and never leak through this enum.

use thiserror::Error;

/// Main popstats error type
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Warehouse connectivity or query execution failures
    #[error("Warehouse error: {0}")]
    Warehouse(String),

    /// Object storage failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Input rejected before it reached an external system
    #[error("Validation error: {0}")]
    Validation(String),

    /// A result did not have the shape the pipeline relies on
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// One or more per-package exports failed after exhausting retries
    #[error("Bulk export failed: {failed} of {total} package(s) could not be exported")]
    BulkExportFailed { failed: usize, total: usize },
}

/// How an error affects the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Connectivity loss, timeouts, lock contention. Worth another attempt.
    Transient,
    /// Retrying cannot help; abort the unit immediately.
    Fatal,
}

impl ExportError {
    /// Classifies the error for the retry loop
    pub fn class(&self) -> ErrorClass {
        match self {
            ExportError::Warehouse(_) | ExportError::Storage(_) | ExportError::Io(_) => {
                ErrorClass::Transient
            }
            ExportError::Configuration(_)
            | ExportError::Serialization(_)
            | ExportError::Validation(_)
            | ExportError::Invariant(_)
            | ExportError::BulkExportFailed { .. } => ErrorClass::Fatal,
        }
    }

    /// Returns true if the error may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}
