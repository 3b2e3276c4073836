//! Route gateway
//!
//! A header-guarded HTTP routing and load-balancing gateway built with Tokio
//! and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http server ──▶ RouteTable ──▶ RouteGroup (guards)
//!                                                          │
//!                                                          ▼
//!                                         plugin chain ──▶ adapter (optional)
//!                                                          │
//!                                                          ▼
//!     Client Response                      RequestForwarder ──▶ Backend
//!     ◀─────────────────────────────────── (streamed)          │
//!                                                              ▼
//!                                              LoadBalancer ──▶ Endpoint
//!                                              (health checkers flip liveness)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use route_gateway::config::load_config;
use route_gateway::health::{HealthContext, ProbeMode};
use route_gateway::http::{build_client, HttpServer};
use route_gateway::lifecycle::{build_gateway, trigger_on_signal, GatewayContext, Shutdown};
use route_gateway::load_balancer::resolve_local_hostname;
use route_gateway::observability::init_logging;
use route_gateway::plugin::Registries;

#[derive(Parser)]
#[command(name = "route-gateway")]
#[command(about = "Header-guarded HTTP routing and load-balancing gateway", long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json).
    #[arg(short, long)]
    config: PathBuf,

    /// Listener to serve; defaults to the first configured listener.
    #[arg(short, long)]
    listener: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.observability)?;

    tracing::info!(
        config = %cli.config.display(),
        listeners = config.listeners.len(),
        routes = config.routes.len(),
        backends = config.backends.len(),
        "Configuration loaded"
    );

    let listener_name = match cli.listener {
        Some(name) => name,
        None => config
            .listeners
            .first()
            .map(|l| l.name.clone())
            .ok_or("configuration defines no listeners")?,
    };

    let client = build_client(&config.timeouts);
    let registries = Registries::with_builtins()?;
    let health = HealthContext::new(
        config.health_check.clone(),
        client.clone(),
        registries.health_checks.clone(),
        ProbeMode::Loop,
    );
    let local_hostname = resolve_local_hostname(config.locality.hostname.as_deref());
    tracing::info!(hostname = %local_hostname, "Local hostname resolved");

    let ctx = GatewayContext {
        store: &config,
        registries: &registries,
        client,
        health,
        local_hostname,
    };
    let gateway = build_gateway(&ctx, &listener_name)?;

    let listener = TcpListener::bind(&gateway.listener().bind_address).await?;
    tracing::info!(
        listener = %listener_name,
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    trigger_on_signal(shutdown.clone());

    let server = HttpServer::new(&gateway, &config.timeouts);
    server.run(listener, shutdown.subscribe()).await?;

    gateway.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}
