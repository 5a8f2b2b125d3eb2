//! Standalone Flightdeck server: WebSocket transport, TOML config, Ctrl+C
//! to stop.
//!
//! ```text
//! flightdeck-server --config flightdeck.toml --listen 0.0.0.0:7777 --log debug
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use flightdeck::{FlightdeckError, ServerConfig, SessionServer};
use flightdeck_transport::WebSocketTransport;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Address to listen on, overriding the config file.
    #[arg(short, long)]
    listen: Option<SocketAddr>,
    /// Connection limit, overriding the config file.
    #[arg(short = 'm', long)]
    max_connections: Option<usize>,
    /// Log filter, e.g. `info` or `flightdeck=debug`. Falls back to
    /// `RUST_LOG`, then `info`.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), FlightdeckError> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(max) = args.max_connections {
        config.max_connections = max;
    }
    let config = config.validated()?;

    let transport = WebSocketTransport::bind(config.listen_addr).await?;
    tracing::info!(addr = %transport.local_addr(), "flightdeck listening");

    let mut server = SessionServer::new(transport, config)?;
    server.run_until(shutdown_signal()).await?;

    tracing::info!("flightdeck stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C, shutting down");
    }
}

fn init_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
