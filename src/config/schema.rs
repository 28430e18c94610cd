//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dev server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Upstream origin the default routing table forwards to.
pub const DEFAULT_UPSTREAM: &str = "http://web:8000";

/// Path the status probe requests.
pub const DEFAULT_PROBE_PATH: &str = "/admin/login/";

/// Root configuration for the dev server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Listener and file-watch settings.
    pub server: ServerConfig,

    /// Proxy rules, checked in declaration order.
    pub proxy: Vec<ProxyRuleConfig>,

    /// Status probe settings.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            proxy: ["/api", "/admin", "/static"]
                .into_iter()
                .map(|prefix| ProxyRuleConfig::dev(prefix, DEFAULT_UPSTREAM))
                .collect(),
            probe: ProbeConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl DevServerConfig {
    /// Address the listener binds to, e.g. `0.0.0.0:5173`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind. `0.0.0.0` listens on all interfaces.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Config file watching.
    pub watch: WatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5173,
            watch: WatchConfig::default(),
        }
    }
}

/// File-watch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll the filesystem instead of relying on native change notification.
    /// Needed on container and VM mounts where inotify events never arrive.
    pub use_polling: bool,

    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            use_polling: true,
            poll_interval_ms: 1000,
        }
    }
}

/// A single proxy rule: requests whose path starts with `prefix` go to `target`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProxyRuleConfig {
    /// Path prefix to match (case-sensitive, plain `starts_with`).
    pub prefix: String,

    /// Upstream origin, e.g. `http://web:8000`.
    pub target: String,

    /// Rewrite the `Host` header to the upstream authority.
    #[serde(default = "default_true")]
    pub change_origin: bool,

    /// Validate upstream TLS certificates.
    #[serde(default = "default_true")]
    pub secure: bool,
}

impl ProxyRuleConfig {
    /// Rule with the dev-only settings: origin rewritten, certificates not checked.
    pub fn dev(prefix: &str, target: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            target: target.to_string(),
            change_origin: true,
            secure: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Status probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Path requested on mount.
    pub path: String,

    /// Give up after this many seconds. Unset means wait for the socket.
    pub timeout_secs: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PROBE_PATH.to_string(),
            timeout_secs: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
