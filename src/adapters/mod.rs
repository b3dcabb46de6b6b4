//! External system integrations for popstats.
//!
//! - [`warehouse`] - Statistics warehouse: report queries, candidate listing, export confirmation
//! - [`blob`] - Azure Blob Storage publishing
//!
//! Both sides are reached through traits so the export pipeline can be
//! exercised against in-memory implementations.

pub mod blob;
pub mod warehouse;
