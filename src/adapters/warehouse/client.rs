//! PostgreSQL warehouse client
//!
//! Connections come from a deadpool pool. Each [`PostgresSession`] holds one
//! pooled connection for its whole lifetime, so a package's report query and
//! its confirmation run over the same connection and nothing else uses it in
//! the meantime.

use super::cell::CellText;
use super::queries::{bind_named, QueryTemplate, QueryTemplates};
use super::traits::{ExportConfirmer, QueryExecutor, Warehouse, WarehouseSession};
use crate::config::schema::WarehouseConfig;
use crate::domain::ids::PackageId;
use crate::domain::{ExportError, QueryParameter, Result, TabularResult};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::{pin_mut, TryStreamExt};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::{NoTls, Row};

/// Pooled PostgreSQL access to the statistics warehouse
pub struct WarehouseClient {
    /// Connection pool
    pool: Pool,

    /// Query templates shared by every session
    templates: Arc<QueryTemplates>,

    /// Configuration
    config: WarehouseConfig,
}

impl WarehouseClient {
    /// Create a new warehouse client
    ///
    /// No connection is opened until the first session is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid, the TLS
    /// connector cannot be built, or a query override directory is unusable.
    pub fn new(config: WarehouseConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_str()
            .parse()
            .map_err(|e| {
                ExportError::Configuration(format!("Invalid warehouse connection string: {}", e))
            })?;

        let ssl_mode = match config.ssl_mode.as_str() {
            "disable" => SslMode::Disable,
            "require" => SslMode::Require,
            _ => SslMode::Prefer,
        };
        pg_config.ssl_mode(ssl_mode);

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Verified,
        };

        let manager = if ssl_mode == SslMode::Disable {
            Manager::from_config(pg_config, NoTls, manager_config)
        } else {
            let connector = native_tls::TlsConnector::builder().build().map_err(|e| {
                ExportError::Configuration(format!("Failed to build TLS connector: {}", e))
            })?;
            let tls = postgres_native_tls::MakeTlsConnector::new(connector);
            Manager::from_config(pg_config, tls, manager_config)
        };

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                ExportError::Configuration(format!("Failed to create connection pool: {}", e))
            })?;

        let templates = match &config.query_dir {
            Some(dir) => QueryTemplates::with_override_dir(dir)?,
            None => QueryTemplates::builtin(),
        };

        Ok(Self {
            pool,
            templates: Arc::new(templates),
            config,
        })
    }

    /// Test the connection to the warehouse
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| ExportError::Warehouse(format!("Connection test failed: {}", e)))?;

        tracing::info!("Warehouse connection test successful");
        Ok(())
    }

    /// Get a connection from the pool
    async fn get_connection(&self) -> Result<Object> {
        self.pool.get().await.map_err(|e| {
            ExportError::Warehouse(format!("Failed to get connection from pool: {}", e))
        })
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_str())
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

/// Strips everything before the host part of a connection URL
pub(crate) fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{}", host))
        .unwrap_or_else(|| "postgresql://***".to_string())
}

#[async_trait]
impl Warehouse for WarehouseClient {
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>> {
        let client = self.get_connection().await?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .batch_execute(&timeout_query)
            .await
            .map_err(|e| ExportError::Warehouse(format!("Failed to set statement timeout: {}", e)))?;

        Ok(Box::new(PostgresSession {
            client,
            templates: self.templates.clone(),
        }))
    }

    async fn reset_connections(&self) {
        // Idle connections are dropped now; connections still checked out are
        // verified with a test query before the pool hands them out again.
        let _ = self.pool.retain(|_, _| false);
        self.pool.manager().statement_caches.clear();

        let status = self.pool.status();
        tracing::info!(
            size = status.size,
            available = status.available,
            "Warehouse connection pool reset"
        );
    }
}

/// One checked-out warehouse connection
pub struct PostgresSession {
    client: Object,
    templates: Arc<QueryTemplates>,
}

#[async_trait]
impl QueryExecutor for PostgresSession {
    async fn execute(
        &self,
        template: QueryTemplate,
        parameters: &[QueryParameter],
    ) -> Result<TabularResult> {
        for parameter in parameters {
            parameter.validate()?;
        }
        let sql = bind_named(self.templates.sql(template), parameters)?;

        let statement = self.client.prepare_cached(&sql).await.map_err(|e| {
            ExportError::Warehouse(format!("Failed to prepare query {}: {}", template, e))
        })?;

        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let mut result = TabularResult::with_columns(columns)?;

        let rows = self
            .client
            .query_raw(&statement, parameters.iter().map(|p| p.value.as_str()))
            .await
            .map_err(|e| ExportError::Warehouse(format!("Query {} failed: {}", template, e)))?;
        pin_mut!(rows);

        while let Some(row) = rows.try_next().await.map_err(|e| {
            ExportError::Warehouse(format!("Reading results of {} failed: {}", template, e))
        })? {
            result.push_row(row_to_text(&row)?)?;
        }

        tracing::debug!(
            template = %template,
            columns = result.columns().len(),
            rows = result.row_count(),
            "Query completed"
        );

        Ok(result)
    }
}

#[async_trait]
impl ExportConfirmer for PostgresSession {
    async fn confirm_export(&self, package_id: &PackageId, dirty_count: i32) -> Result<()> {
        // Typed values below follow the order of these names
        let id = package_id.as_str();
        let parameters = [
            QueryParameter::new("PackageId", id.chars().count(), id),
            QueryParameter::new("DirtyCount", 11, dirty_count.to_string()),
        ];
        let sql = bind_named(self.templates.sql(QueryTemplate::ConfirmExport), &parameters)?;
        self.client
            .execute(sql.as_str(), &[&id, &dirty_count])
            .await
            .map_err(|e| {
                ExportError::Warehouse(format!("Failed to confirm export of {}: {}", package_id, e))
            })?;
        Ok(())
    }
}

fn row_to_text(row: &Row) -> Result<Vec<String>> {
    (0..row.len())
        .map(|i| {
            row.try_get::<_, CellText>(i)
                .map(CellText::into_inner)
                .map_err(|e| {
                    ExportError::Invariant(format!(
                        "Column '{}' cannot be rendered as text: {}",
                        row.columns()[i].name(),
                        e
                    ))
                })
        })
        .collect()
}
