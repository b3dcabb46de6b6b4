//! CLI command implementations

pub mod export;
pub mod status;
pub mod validate;

use crate::adapters::warehouse::WarehouseClient;
use crate::cli::EXIT_CONNECTION_ERROR;
use crate::config::WarehouseConfig;

/// Build the warehouse client and check it answers
///
/// On failure the error is printed and the connection exit code returned.
pub(crate) async fn connect_warehouse(
    config: &WarehouseConfig,
) -> std::result::Result<WarehouseClient, i32> {
    let client = match WarehouseClient::new(config.clone()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create warehouse client");
            eprintln!("Failed to initialize warehouse client: {e}");
            return Err(EXIT_CONNECTION_ERROR);
        }
    };

    if let Err(e) = client.test_connection().await {
        tracing::error!(
            error = %e,
            warehouse = %client.connection_string_safe(),
            "Warehouse is unreachable"
        );
        eprintln!(
            "Failed to connect to warehouse {}: {e}",
            client.connection_string_safe()
        );
        return Err(EXIT_CONNECTION_ERROR);
    }

    Ok(client)
}
