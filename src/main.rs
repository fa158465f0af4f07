//! Library lending gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!   API request    │  http (axum)  ──▶  orchestrator                  │
//!  ───────────────▶│                      │      │      │             │
//!                  │                      ▼      ▼      ▼             │
//!                  │               library  rating  reservation       │   backends
//!                  │               client   client  client   ─────────┼──────────▶
//!                  │                  │       │       │               │
//!                  │                  └── circuit breakers ──┘        │
//!                  │                          │                       │
//!                  │                   retry queue (rating fixes)     │
//!                  └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use library_gateway::config::{load_config, GatewayConfig};
use library_gateway::http::HttpServer;
use library_gateway::lifecycle::{assemble, signals, Shutdown};
use library_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "library-gateway")]
#[command(about = "Gateway for the library, rating and reservation services", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("library-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let state = assemble(&config, &shutdown)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::terminate().await;
        trigger.trigger();
    });

    HttpServer::new(state, &config.timeouts)
        .run(listener, shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
