//! Edge gateway
//!
//! Single entry point for a small set of backend services.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                     EDGE GATEWAY                      │
//!                              │                                                       │
//!     Client Request           │  ┌─────────┐    ┌────────────┐    ┌─────────────┐     │
//!     ─────────────────────────┼─▶│  http   │───▶│  routing   │───▶│    auth     │─────┼──── Authority
//!                              │  │ server  │    │ dispatcher │    │  validator  │     │     (gRPC)
//!                              │  └─────────┘    └─────┬──────┘    └─────────────┘     │
//!                              │                       │                                │
//!                              │                       ▼                                │
//!                              │               ┌──────────────┐                         │
//!                              │               │   handlers   │                         │
//!                              │               │ proxy/produce│                         │
//!                              │               └──┬────────┬──┘                         │
//!                              │                  │        │                            │
//!     Client Response          │                  │        ▼                            │
//!     ◀────────────────────────┼──────────────────┘   ┌─────────┐                       │
//!                              │                      │  queue  │ (background delivery) │
//!                              │                      └─────────┘                       │
//!                              │                                                       │
//!                              │  config · observability · resilience · lifecycle      │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{load_config, GatewayConfig};
use edge_gateway::lifecycle::signals::shutdown_signal;
use edge_gateway::lifecycle::{assemble, Shutdown};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::queue::delivery::run_delivery;
use edge_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "edge-gateway", version, about = "Authenticating edge gateway")]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply without it.
    #[arg(short, long, env = "EDGE_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Print the resolved route table as JSON and exit.
    #[arg(long)]
    print_routes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        authority = %config.auth.authority_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let gateway = assemble(&config)?;

    if cli.print_routes {
        let routes = gateway.dispatcher.table().descriptors();
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let delivery = tokio::spawn(run_delivery(gateway.deliveries));

    let listener = TcpListener::bind(config.listener.bind_address.as_str()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(&config, gateway.dispatcher);
    server.run(listener, server_shutdown).await?;

    // Producers are gone once the server drops its router; drain what is left.
    let delivered = delivery.await?;
    tracing::info!(delivered, "Shutdown complete");
    Ok(())
}
