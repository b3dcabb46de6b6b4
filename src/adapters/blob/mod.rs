//! Object storage integration
//!
//! Reports are published to Azure Blob Storage through the
//! [`ArtifactPublisher`] trait.

pub mod client;
pub mod traits;

pub use client::AzureBlobPublisher;
pub use traits::{ArtifactPublisher, JSON_CONTENT_TYPE};
