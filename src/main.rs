//! Authenticating reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                  GATEKEEPER PROXY                     │
//!                         │                                                       │
//!    Client Request       │  ┌─────────┐   ┌──────────┐   ┌──────────────┐        │
//!    ─────────────────────┼─▶│  http   │──▶│ routing  │──▶│     auth     │        │
//!                         │  │ server  │   │ registry │   │ authenticator│        │
//!                         │  └─────────┘   └──────────┘   └──────┬───────┘        │
//!                         │                                      │                │
//!                         │                                      ▼                │
//!                         │                 ┌──────────┐   ┌──────────────┐       │    Account
//!                         │                 │ identity │◀──│   validate   │       │    Service
//!                         │                 │ resolver │───┼──────────────┼───────┼──▶
//!                         │                 └──────────┘   └──────┬───────┘       │
//!                         │                                       ▼               │
//!    Client Response      │  ┌─────────┐                   ┌──────────────┐       │
//!    ◀────────────────────┼──│ relay   │◀──────────────────│   forward    │◀──────┼──── Upstream
//!                         │  └─────────┘                   └──────────────┘       │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use gatekeeper_proxy::config::{load_config, ProxyConfig};
use gatekeeper_proxy::lifecycle::{signals, Shutdown};
use gatekeeper_proxy::observability::{logging, metrics};
use gatekeeper_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "gatekeeper-proxy")]
#[command(about = "Authenticating path-based reverse proxy", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(&config.observability);
    tracing::info!("gatekeeper-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        account_service = %config.identity.account_base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.auth.test_session_bypass.enabled {
        tracing::warn!("Test-session authentication bypass is ENABLED; do not run this in production");
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(&config)?;
    let server_shutdown = shutdown.subscribe();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { signals::wait_for_signal(&shutdown).await }
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
