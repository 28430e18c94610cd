//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → GET /        → page.rs (mount probe, render status page)
//!     → anything else → forward.rs (proxy table lookup, Host rewrite, relay)
//!     → Send to client
//! ```

pub mod forward;
pub mod page;
pub mod server;

pub use server::{AppState, HttpServer, ServeError};
