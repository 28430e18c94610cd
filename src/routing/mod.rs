//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (proxy table lookup)
//!     → matcher.rs (evaluate prefix)
//!     → Return: matched ProxyRoute or None
//!
//! Route Compilation (at startup and on reload):
//!     ProxyRuleConfig[]
//!     → Parse targets, precompute Host values
//!     → Freeze as immutable ProxyTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use router::{ProxyRoute, ProxyTable, RouteError};
