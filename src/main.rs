//! Compression proxy binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │               COMPRESSION PROXY                 │
//!                      │                                                 │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌──────────┐   │
//!   ──────────────────▶│  │  http   │───▶│  proxy   │───▶│ upstream │───┼──▶ Origin
//!                      │  │ server  │    │ handler  │    │  client  │   │    Server
//!                      │  └─────────┘    └────┬─────┘    └────┬─────┘   │
//!                      │                      │               │         │
//!                      │                      ▼               │         │
//!                      │               ┌──────────┐           │         │
//!                      │               │ encoding │◀──────────┘         │
//!                      │               │ dec/enc  │                     │
//!                      │               └────┬─────┘                     │
//!   Client Response    │  ┌─────────┐       │                           │
//!   ◀──────────────────┼──│response │◀──────┘                           │
//!                      │  │  sink   │                                   │
//!                      │  └─────────┘                                   │
//!                      │                                                 │
//!                      │  ┌─────────────────────────────────────────┐   │
//!                      │  │          Cross-Cutting Concerns          │   │
//!                      │  │  ┌────────┐ ┌─────────────┐ ┌─────────┐ │   │
//!                      │  │  │ config │ │observability│ │lifecycle│ │   │
//!                      │  │  └────────┘ └─────────────┘ └─────────┘ │   │
//!                      │  └─────────────────────────────────────────┘   │
//!                      └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use compression_proxy::config::{self, ProxyConfig};
use compression_proxy::http::HttpServer;
use compression_proxy::lifecycle::shutdown::{self, Shutdown};
use compression_proxy::observability;

/// Bandwidth-saving proxy that recompresses origin responses.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };

    observability::init_logging(&config.observability.log_level);

    tracing::info!("compression-proxy v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        upstream_timeout_secs = config.upstream.request_timeout_secs,
        min_size = config.compression.min_size,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                observability::init_metrics(addr)?;
                tracing::info!(address = %addr, "Metrics endpoint started");
            }
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let coordinator = Shutdown::new();
    let receiver = coordinator.subscribe();
    tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        coordinator.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
