//! rest-dispatcher
//!
//! Serves an in-memory bookstore through the resource dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ http::server (axum, request id, trace, timeout)
//!                     │
//!                     ▼
//!                 dispatch::Dispatcher
//!                     │  resource::resolver ── uri::UriPattern (match + rank)
//!                     │        │
//!                     │        └─ sub-resource locators (descend with remainder)
//!                     ▼
//!                 method selection (HTTP method, Content-Type, Accept)
//!                     │
//!                     ▼
//!                 handler ──▶ Response ──▶ http::response ──▶ Client
//! ```

mod bookstore;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rest_dispatcher::config::{load_config, DispatcherConfig};
use rest_dispatcher::lifecycle::{signals, Shutdown};
use rest_dispatcher::observability::{logging, metrics};
use rest_dispatcher::HttpServer;

#[derive(Parser)]
#[command(name = "rest-dispatcher")]
#[command(about = "Resource dispatcher serving a demo bookstore", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatcherConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!("rest-dispatcher v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_entity_bytes = config.dispatch.max_entity_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(bookstore::registry()?);
    tracing::info!(resources = registry.len(), "Resources registered");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, registry);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
