// popstats - Package popularity report exporter
// Copyright (c) 2025 Popstats Contributors
// Licensed under the MIT License

//! # popstats - package popularity reports
//!
//! popstats reads download statistics from a PostgreSQL statistics warehouse
//! and publishes them as JSON reports to Azure Blob Storage.
//!
//! ## Overview
//!
//! A run has two phases:
//! - **Aggregate reports**: `permonth.json`, `recentpopularitydetail.json` and
//!   `recentpopularity.json`, produced one after the other
//! - **Per-package reports**: `recentpopularity_<package id>.json` for every
//!   package with unexported changes, produced by a bounded worker pool and
//!   confirmed back to the warehouse once published
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export orchestration, retry, JSON encoding, blob naming
//! - [`adapters`] - Warehouse and Blob Storage integrations
//! - [`domain`] - Records, identifiers and the error taxonomy
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use popstats::adapters::blob::AzureBlobPublisher;
//! use popstats::adapters::warehouse::WarehouseClient;
//! use popstats::config::load_config;
//! use popstats::core::export::{ExportDispatcher, ExportSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("popstats.toml")?;
//!
//!     let dispatcher = ExportDispatcher::new(
//!         ExportSettings::from_config(&config),
//!         Arc::new(WarehouseClient::new(config.warehouse.clone())?),
//!         Arc::new(AzureBlobPublisher::new(&config.storage)?),
//!     );
//!
//!     // Fails with BulkExportFailed if any package could not be exported
//!     let summary = dispatcher.run_checked().await?;
//!     println!("Exported {} package report(s)", summary.successful_packages);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::ExportError`]. Each error is either
//! transient (warehouse, storage and I/O faults) or fatal; only transient
//! errors are retried:
//!
//! ```rust
//! use popstats::domain::{ErrorClass, ExportError};
//!
//! let err = ExportError::Invariant("missing PackageId column".to_string());
//! assert_eq!(err.class(), ErrorClass::Fatal);
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
