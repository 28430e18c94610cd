//! Apex development server.
//!
//! Serves the integration status page and relays backend paths to the web
//! service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                    DEV SERVER                     │
//!    Browser          │  ┌─────────┐  GET /   ┌────────────────────────┐  │
//!    ─────────────────┼─▶│  http   │─────────▶│ status page + probe    │  │
//!                     │  │ server  │          └───────────┬────────────┘  │
//!                     │  └────┬────┘                      │ GET /admin/login/
//!                     │       │ ◀─────────────────────────┘ (loopback)    │
//!                     │       ▼ /api /admin /static                       │
//!                     │  ┌─────────┐    ┌──────────────┐                  │
//!                     │  │ routing │───▶│   forward    │──────────────────┼──▶ web:8000
//!                     │  │  table  │    │ Host rewrite │                  │
//!                     │  └─────────┘    └──────────────┘                  │
//!                     │                                                   │
//!                     │  config + polling watcher · logging · metrics     │
//!                     └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use apex_devserver::config::watcher::ConfigWatcher;
use apex_devserver::http::HttpServer;
use apex_devserver::lifecycle::{signals, startup, Shutdown};
use apex_devserver::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "apex-devserver")]
#[command(about = "Development server with backend proxy and integration status page", long_about = None)]
struct Cli {
    /// TOML config file. Watched for proxy table changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind (overrides server.host).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides server.port).
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides observability.log_level).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = startup::Overrides {
        host: cli.host,
        port: cli.port,
        log_level: cli.log_level,
    };
    let config = startup::resolve_config(cli.config.as_deref(), overrides)?;

    logging::init(&config.observability)?;

    tracing::info!("apex-devserver v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.bind_address(),
        routes = config.proxy.len(),
        probe_path = %config.probe.path,
        "Configuration loaded"
    );
    for rule in config.proxy.iter().filter(|rule| !rule.secure) {
        tracing::warn!(
            prefix = %rule.prefix,
            target = %rule.target,
            "Upstream TLS validation disabled; development use only"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    // Keep the watcher handle alive for the life of the server.
    let (config_updates, _watcher) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.server.watch.clone());
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
