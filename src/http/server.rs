//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router: status page at `/`, proxy for everything else
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Swap in reloaded proxy tables
//! - Graceful shutdown

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::DevServerConfig;
use crate::http::{forward, page};
use crate::probe::{FetchError, HttpFetcher, ProbeSettings, StatusFetcher};
use crate::routing::{ProxyTable, RouteError};

/// Error starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("invalid proxy table: {0}")]
    Routes(#[from] RouteError),
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to set up status probe: {0}")]
    Probe(#[from] FetchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ArcSwap<ProxyTable>>,
    pub clients: forward::UpstreamClients,
    pub probe_fetcher: Arc<dyn StatusFetcher>,
    pub probe_settings: ProbeSettings,
}

/// The development server.
pub struct HttpServer {
    config: DevServerConfig,
    table: Arc<ArcSwap<ProxyTable>>,
    clients: forward::UpstreamClients,
}

impl HttpServer {
    /// Create a new server with the given configuration.
    pub fn new(config: DevServerConfig) -> Result<Self, ServeError> {
        let table = ProxyTable::from_config(&config.proxy)?;
        let clients = forward::UpstreamClients::new()?;

        Ok(Self {
            config,
            table: Arc::new(ArcSwap::from_pointee(table)),
            clients,
        })
    }

    /// Shared handle to the live proxy table.
    pub fn proxy_table(&self) -> Arc<ArcSwap<ProxyTable>> {
        Arc::clone(&self.table)
    }

    /// Build the Axum router; the status page probes through `probe_fetcher`.
    pub fn router(&self, probe_fetcher: Arc<dyn StatusFetcher>) -> Router {
        let state = AppState {
            table: self.proxy_table(),
            clients: self.clients.clone(),
            probe_fetcher,
            probe_settings: ProbeSettings::from(&self.config.probe),
        };

        Router::new()
            .route("/", get(page::status_page))
            .fallback(forward::forward)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configs arriving on `config_updates` replace the proxy table; listener
    /// and probe settings stay as they were at startup.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DevServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        let origin = probe_origin(addr);
        let fetcher = HttpFetcher::new(&origin)?;

        tracing::info!(
            address = %addr,
            probe_origin = %origin,
            routes = self.table.load().len(),
            "HTTP server starting"
        );

        let table = self.proxy_table();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = reload_table(&table, &config) {
                    tracing::error!(error = %e, "Rejected reloaded proxy table");
                }
            }
        });

        let app = self.router(Arc::new(fetcher));
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        reloader.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Compile the proxy rules of `config` and swap them in.
///
/// On error the current table stays in place.
pub fn reload_table(table: &ArcSwap<ProxyTable>, config: &DevServerConfig) -> Result<(), RouteError> {
    let next = ProxyTable::from_config(&config.proxy)?;
    tracing::info!(routes = next.len(), "Proxy table reloaded");
    table.store(Arc::new(next));
    Ok(())
}

/// Origin the status page probes: the server itself, over loopback when
/// bound to all interfaces.
pub fn probe_origin(addr: SocketAddr) -> String {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, addr.port()))
}
