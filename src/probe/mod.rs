//! Status probe subsystem.
//!
//! # Data Flow
//! ```text
//! StatusProbe::mount (component.rs)
//!     → spawn one request task
//!     → fetch.rs (GET /admin/login/, status code only)
//!     → status.rs (Checking → one terminal state)
//!     → watch channel notifies subscribers
//!     → view.rs renders the page from the current status
//! ```
//!
//! # Design Decisions
//! - The request is issued from the constructor only; nothing else can fire it
//! - Dropping the probe aborts its request task
//! - Failure detail goes to the log, never to the rendered page

pub mod component;
pub mod fetch;
pub mod status;
pub mod view;

pub use component::{ProbeSettings, StatusProbe};
pub use fetch::{FetchError, HttpFetcher, StatusFetcher};
pub use status::{ConnectionStatus, ProbeOutcome};
