//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devserver_proxy_requests_total` (counter): forwarded requests by prefix, status
//! - `devserver_proxy_request_duration_seconds` (histogram): upstream round trip
//! - `devserver_probe_outcomes_total` (counter): settled probes by outcome
//! - `devserver_probe_duration_seconds` (histogram): mount to settle
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one request relayed (or refused) by the proxy.
pub fn record_proxy_request(prefix: &str, status: u16, start: Instant) {
    let labels = [
        ("prefix", prefix.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("devserver_proxy_requests_total", &labels).increment(1);
    metrics::histogram!("devserver_proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a probe reaching its terminal status.
pub fn record_probe_outcome(outcome: &'static str, start: Instant) {
    metrics::counter!("devserver_probe_outcomes_total", "outcome" => outcome).increment(1);
    metrics::histogram!("devserver_probe_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
