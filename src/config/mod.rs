//! Configuration management for popstats.
//!
//! popstats reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `POPSTATS_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [warehouse]
//! connection_string = "${POPSTATS_WAREHOUSE_CONNECTION_STRING}"
//!
//! [storage]
//! account = "nugetstats"
//! container = "popularity"
//! sas_token = "${POPSTATS_STORAGE_SAS_TOKEN}"
//!
//! [export]
//! max_workers = 4
//! max_attempts = 10
//! backoff_seconds = 20
//! per_package_source = "dirty"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, PerPackageSource, PopstatsConfig,
    StorageAuthType, StorageConfig, WarehouseConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
