//! PostgreSQL Bridge Server - Main entry point.
//!
//! Loads the persisted connection record (if any), applies it best-effort,
//! and runs the selected front end.

use clap::Parser;
use pg_mcp_server::config::{Config, TransportMode};
use pg_mcp_server::db::PoolManager;
use pg_mcp_server::store::{ConfigStore, JsonFileStore};
use pg_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    if config.enable_logs {
        init_tracing(&config);
    }

    info!(
        transport = %config.transport,
        "Starting PostgreSQL bridge server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = Arc::new(JsonFileStore::new(config.config_file.clone()));
    let manager = Arc::new(PoolManager::new(store.clone()));

    // Apply the persisted connection, if one exists. The server still starts
    // unconfigured when the record is unreadable or the database is down.
    match store.load() {
        Ok(Some(info)) => {
            info!(target = %info.masked_dsn(), "Applying persisted database configuration");
            if let Err(e) = manager.configure(info).await {
                warn!(error = %e, "Persisted configuration could not be applied; starting unconfigured");
            }
        }
        Ok(None) => {
            info!(
                path = %store.path().display(),
                "No persisted database configuration found; waiting for setup"
            );
        }
        Err(e) => {
            warn!(error = %e, "Failed to load persisted configuration; starting unconfigured");
        }
    }

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(manager);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(manager, &config.http_host, config.http_port);
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
