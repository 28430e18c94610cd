//! Apex development server library.
//!
//! A local dev server that serves an integration status page and relays API,
//! admin and static-asset paths to the backing web service.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod routing;

pub use config::schema::DevServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use probe::{ConnectionStatus, StatusProbe};
