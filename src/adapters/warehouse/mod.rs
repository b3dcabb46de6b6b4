//! Statistics warehouse integration
//!
//! Report queries, the export candidate listing and export confirmation all
//! run against the warehouse through the traits in [`traits`].

pub mod cell;
pub mod client;
pub mod queries;
pub mod traits;

pub use client::{PostgresSession, WarehouseClient};
pub use queries::{QueryTemplate, QueryTemplates};
pub use traits::{ExportConfirmer, QueryExecutor, Warehouse, WarehouseSession};
