//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DevServerConfig (validated, immutable)
//!     → CLI overrides applied by the binary
//!
//! On file change:
//!     watcher.rs detects change (polling or native)
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in a new proxy table
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DevServerConfig, LogFormat, ObservabilityConfig, ProbeConfig, ProxyRuleConfig, ServerConfig,
    WatchConfig,
};
