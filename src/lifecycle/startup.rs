//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration (file or defaults)
//! - Apply command-line overrides
//! - Validate the result before anything binds
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Overrides are validated together with the file, so a bad `--port`
//!   is reported like a bad `port =`

use std::path::Path;

use crate::config::loader::{read_config, ConfigError};
use crate::config::validation::validate_config;
use crate::config::DevServerConfig;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Load the config at `path` (or the defaults), apply `overrides`, validate.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<DevServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => DevServerConfig::default(),
    };

    if let Some(host) = overrides.host {
        config.server.host = host;
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(level) = overrides.log_level {
        config.observability.log_level = level;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
