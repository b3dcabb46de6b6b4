//! Report artifacts: JSON encoding and blob naming

pub mod encoder;
pub mod naming;

pub use encoder::JsonEncoder;
pub use naming::{package_blob_name, AggregateReport, DEFAULT_CONTAINER, PACKAGE_REPORT_PREFIX};
