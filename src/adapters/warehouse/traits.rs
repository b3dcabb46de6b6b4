//! Warehouse abstraction traits
//!
//! The export pipeline talks to the warehouse through these traits only, so
//! tests can substitute in-memory implementations.

use super::queries::QueryTemplate;
use crate::domain::ids::PackageId;
use crate::domain::{QueryParameter, Result, TabularResult};
use async_trait::async_trait;

/// Runs named, parameterized queries
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a query template and collect its rows as text
    ///
    /// Column order is exactly the order the store returns. Parameters are
    /// bound by name; a value longer than its `max_length` is rejected.
    ///
    /// # Errors
    ///
    /// Connectivity and execution faults are `ExportError::Warehouse`
    /// (transient). This method never retries.
    async fn execute(
        &self,
        template: QueryTemplate,
        parameters: &[QueryParameter],
    ) -> Result<TabularResult>;
}

/// Tells the source of truth that a package's pending changes were exported
#[async_trait]
pub trait ExportConfirmer: Send + Sync {
    /// Confirm an export with the dirty count captured at listing time
    ///
    /// Must only be called after the package's report has been published.
    async fn confirm_export(&self, package_id: &PackageId, dirty_count: i32) -> Result<()>;
}

/// One connection scope: every call goes over the same connection
pub trait WarehouseSession: QueryExecutor + ExportConfirmer {}

impl<T: QueryExecutor + ExportConfirmer> WarehouseSession for T {}

/// Connection source for the warehouse
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Check out a connection scope
    ///
    /// The scope is released when the returned session is dropped. Sessions
    /// are never shared between concurrently running units of work.
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>>;

    /// Discard pooled connections so the next session starts on a fresh one
    ///
    /// Called between retry attempts: a failed attempt may have left its
    /// connection in an unusable state.
    async fn reset_connections(&self);
}
