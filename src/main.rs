//! Anomaly records service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http server ──▶ records normalizer ──▶ GetRecordsRequest
//!                    (request id,    (body | source |           │
//!                     trace, limits)  query params)             ▼
//!     Client Response                                     RecordsExecutor
//!     ◀───────────── response relay ◀──────────────────── (record store)
//! ```
//!
//! Cross-cutting: config (TOML), observability (tracing, Prometheus),
//! lifecycle (startup, signals, graceful shutdown).

use std::path::PathBuf;

use anomaly_records::config::{load_config, ServiceConfig};
use anomaly_records::lifecycle::{signals, startup, Shutdown};
use anomaly_records::observability::logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "anomaly-records")]
#[command(about = "Serves paginated anomaly records for analysis jobs", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "ANOMALY_RECORDS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!("anomaly-records v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.api.base_path,
        max_result_window = config.api.max_result_window,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    startup::run(config, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
