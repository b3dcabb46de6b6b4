//! Export orchestration
//!
//! - [`dispatcher`] - Aggregate and per-package phases of a run
//! - [`retry`] - Bounded retry with connection recovery
//! - [`candidates`] - Per-package work lists from query results
//! - [`summary`] - Run summary and collected failures

pub mod candidates;
pub mod dispatcher;
pub mod retry;
pub mod summary;

pub use dispatcher::{AggregateOutput, ExportDispatcher, ExportSettings};
pub use retry::{retry_decision, Attempted, RetryDecision, RetryExecutor, RetryPolicy};
pub use summary::{ExportSummary, PackageFailure};
