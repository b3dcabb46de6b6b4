//! Error context extension trait
//!
//! Works like `anyhow::Context` for `Result<T, ExportError>`, with one
//! difference: the context is folded into the message of the existing variant,
//! so the error keeps its [`ErrorClass`](crate::domain::ErrorClass) and the
//! retry loop still sees a transient fault as transient.
//!
//! # Examples
//!
//! ```rust
//! use popstats::domain::{ExportError, Result};
//! use popstats::domain::context::ResultExt;
//!
//! fn run_report(blob: &str) -> Result<()> {
//!     execute()
//!         .with_context(|| format!("Report {}", blob))?;
//!     Ok(())
//! }
//! # fn execute() -> Result<()> { Ok(()) }
//! ```

use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use std::fmt::Display;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// The context is evaluated eagerly; use `.with_context()` if it is
    /// expensive to build.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error, computing it only when an error occurred
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ExportError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| e.into().prefixed(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().prefixed(f()))
    }
}

impl ExportError {
    /// Prefix the error message with `context`, keeping the variant
    pub fn prefixed(self, context: impl Display) -> Self {
        let wrap = |message: String| format!("{context}: {message}");
        match self {
            ExportError::Configuration(m) => ExportError::Configuration(wrap(m)),
            ExportError::Warehouse(m) => ExportError::Warehouse(wrap(m)),
            ExportError::Storage(m) => ExportError::Storage(wrap(m)),
            ExportError::Serialization(m) => ExportError::Serialization(wrap(m)),
            ExportError::Validation(m) => ExportError::Validation(wrap(m)),
            ExportError::Invariant(m) => ExportError::Invariant(wrap(m)),
            ExportError::Io(m) => ExportError::Io(wrap(m)),
            other @ ExportError::BulkExportFailed { .. } => other,
        }
    }
}
