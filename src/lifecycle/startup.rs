//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the record store from configuration
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::records::{RecordStore, StoreError};

/// Build the record store described by `config`.
pub fn build_store(config: &ServiceConfig) -> Result<RecordStore, StoreError> {
    let window = config.api.max_result_window;
    match &config.store.fixture_path {
        Some(path) => RecordStore::from_fixture(path, window),
        None => {
            tracing::warn!("No record fixture configured, serving an empty store");
            Ok(RecordStore::new(window))
        }
    }
}

/// Start every subsystem and serve until `shutdown` fires.
pub async fn run(
    config: ServiceConfig,
    shutdown: ShutdownSignal,
) -> Result<(), Box<dyn Error>> {
    let store = build_store(&config)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, Arc::new(store));
    server.run(listener, shutdown).await?;
    Ok(())
}
