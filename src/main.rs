//! CORS relay gateway (v1)
//!
//! Lets a browser page served from an allowed origin fetch a cross-origin
//! resource: `GET /?https://other.site/data` with `Origin: https://app.example`
//! is validated, fetched once, and relayed back with CORS headers.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http server ─▶ validator ──reject──▶ 4xx/5xx │
//!                         │                     │                        │
//!                         │                  approve                     │
//!                         │                     ▼                        │
//!     Client Response     │   assemble ◀──── fetcher ◀───────────────────┼──── Target
//!     ◀───────────────────┼── (CORS + upstream headers, status, body)   │     Server
//!                         │                                              │
//!                         │  config (file / env, hot reload)             │
//!                         │  observability (logs, metrics), lifecycle    │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use cors_relay::config::validation::origin_policy_warnings;
use cors_relay::config::{load_config, ConfigWatcher, RelayConfig};
use cors_relay::lifecycle::signals::wait_for_signal;
use cors_relay::observability::{logging, metrics};
use cors_relay::{HttpServer, ReqwestClient, Shutdown};

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(about = "Relay GET requests for allowed origins and add CORS headers", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes.
    #[arg(short, long, env = "CORS_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin_env_var = %config.origin.env_var,
        static_pattern = config.origin.allowed_pattern.is_some(),
        upstream_timeout_secs = config.upstream.request_timeout_secs,
        "Configuration loaded"
    );
    for warning in origin_policy_warnings(&config.origin) {
        tracing::warn!("{}", warning);
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = Arc::new(ReqwestClient::from_config(&config.upstream)?);

    // Keep the watcher handle alive for the lifetime of the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, client);
    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    shutdown.supervise(server_task, wait_for_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
