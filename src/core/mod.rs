//! Core business logic for popstats.
//!
//! # Modules
//!
//! - [`export`] - Export orchestration: dispatcher, retry executor, summary
//! - [`report`] - JSON encoding of query results and blob naming
//!
//! # Export Workflow
//!
//! 1. **Aggregate reports**: per-month, recent popularity detail and recent
//!    popularity reports are queried, encoded and published, in that order
//! 2. **Snapshot**: the packages to export are listed once
//! 3. **Per-package reports**: up to `max_workers` packages at a time are
//!    queried, encoded, published and confirmed, each retried as a unit
//! 4. **Report**: failures are collected and surfaced in the summary
//!
//! # Example
//!
//! ```rust,no_run
//! use popstats::adapters::blob::AzureBlobPublisher;
//! use popstats::adapters::warehouse::WarehouseClient;
//! use popstats::config::load_config;
//! use popstats::core::export::{ExportDispatcher, ExportSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("popstats.toml")?;
//!
//! let warehouse = Arc::new(WarehouseClient::new(config.warehouse.clone())?);
//! let publisher = Arc::new(AzureBlobPublisher::new(&config.storage)?);
//!
//! let dispatcher = ExportDispatcher::new(ExportSettings::from_config(&config), warehouse, publisher);
//! let summary = dispatcher.run().await?;
//!
//! println!("Packages: {}", summary.total_packages);
//! println!("Failed: {}", summary.failed_packages);
//! summary.ensure_success()?;
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod report;
