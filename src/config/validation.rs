//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, poll interval)
//! - Check proxy rules (prefix shape, duplicates, upstream URL)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::DevServerConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.host must not be empty")]
    EmptyHost,
    #[error("server.port must not be 0")]
    ZeroPort,
    #[error("server.watch.poll_interval_ms must be greater than 0")]
    ZeroPollInterval,
    #[error("proxy prefix {0:?} must start with '/'")]
    PrefixNotAbsolute(String),
    #[error("proxy prefix {0:?} is declared more than once")]
    DuplicatePrefix(String),
    #[error("proxy target {target:?} for {prefix:?} is invalid: {reason}")]
    InvalidTarget {
        prefix: String,
        target: String,
        reason: String,
    },
    #[error("probe.path {0:?} must start with '/'")]
    ProbePathNotAbsolute(String),
    #[error("probe.timeout_secs must be greater than 0")]
    ZeroProbeTimeout,
    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed config, collecting every problem found.
pub fn validate_config(config: &DevServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.server.watch.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    let mut seen = HashSet::new();
    for rule in &config.proxy {
        if !rule.prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(rule.prefix.clone()));
        }
        if !seen.insert(rule.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(rule.prefix.clone()));
        }
        if let Err(reason) = check_target(&rule.target) {
            errors.push(ValidationError::InvalidTarget {
                prefix: rule.prefix.clone(),
                target: rule.target.clone(),
                reason,
            });
        }
    }

    if !config.probe.path.starts_with('/') {
        errors.push(ValidationError::ProbePathNotAbsolute(config.probe.path.clone()));
    }
    if config.probe.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroProbeTimeout);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Upstream targets must be absolute http(s) URLs with a host.
pub(crate) fn check_target(target: &str) -> Result<Url, String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {other:?}")),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(url)
}
