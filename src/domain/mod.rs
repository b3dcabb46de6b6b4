//! Domain models and types for popstats.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`PackageId`])
//! - **Pipeline records** ([`ExportCandidate`], [`TabularResult`], [`QueryParameter`])
//! - **Error types** ([`ExportError`], [`ErrorClass`])
//! - **Result type alias** ([`Result`])
//!
//! # Invariants
//!
//! Records enforce their invariants at construction:
//!
//! ```rust
//! use popstats::domain::TabularResult;
//!
//! let columns = vec!["PackageId".to_string(), "Downloads".to_string()];
//! let rows = vec![vec!["Foo".to_string()]];
//!
//! // A row with the wrong number of cells never makes it into a result
//! assert!(TabularResult::new(columns, rows).is_err());
//! ```

pub mod candidate;
pub mod context;
pub mod errors;
pub mod ids;
pub mod result;
pub mod tabular;

pub use candidate::{ExportCandidate, PackageExport};
pub use context::ResultExt;
pub use errors::{ErrorClass, ExportError};
pub use ids::PackageId;
pub use result::Result;
pub use tabular::{QueryParameter, TabularResult};
