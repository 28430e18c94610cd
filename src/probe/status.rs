//! Connection status state machine.
//!
//! # States
//! - Checking: initial value, request in flight
//! - Connected: terminal, the service answered 200
//! - ConnectedWithUnexpectedStatus: terminal, the service answered anything else
//! - Unreachable: terminal, the request itself failed
//!
//! # State Transitions
//! ```text
//! Checking --[response, code==200]--> Connected
//! Checking --[response, code!=200]--> ConnectedWithUnexpectedStatus
//! Checking --[request failure]------> Unreachable
//! ```
//!
//! No transition leaves a terminal state.

use std::fmt;

use axum::http::StatusCode;

use crate::probe::fetch::FetchError;

/// What the single probe request produced.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// A response arrived; only its status code is kept.
    Responded(StatusCode),
    /// The request could not complete.
    Failed(FetchError),
}

impl From<Result<StatusCode, FetchError>> for ProbeOutcome {
    fn from(result: Result<StatusCode, FetchError>) -> Self {
        match result {
            Ok(code) => ProbeOutcome::Responded(code),
            Err(e) => ProbeOutcome::Failed(e),
        }
    }
}

/// Display status of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Checking,
    Connected(StatusCode),
    ConnectedWithUnexpectedStatus(StatusCode),
    Unreachable,
}

impl ConnectionStatus {
    /// Next status after observing `outcome`. Terminal states never change.
    pub fn settle(self, outcome: &ProbeOutcome) -> Self {
        if self.is_terminal() {
            return self;
        }
        match outcome {
            ProbeOutcome::Responded(code) if *code == StatusCode::OK => Self::Connected(*code),
            ProbeOutcome::Responded(code) => Self::ConnectedWithUnexpectedStatus(*code),
            ProbeOutcome::Failed(_) => Self::Unreachable,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Checking)
    }

    /// Status code observed, if a response arrived.
    pub fn code(&self) -> Option<StatusCode> {
        match self {
            Self::Connected(code) | Self::ConnectedWithUnexpectedStatus(code) => Some(*code),
            Self::Checking | Self::Unreachable => None,
        }
    }

    /// Stable machine-readable name, used for metrics labels and JSON output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Connected(_) => "connected",
            Self::ConnectedWithUnexpectedStatus(_) => "unexpected_status",
            Self::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => f.write_str("Checking connection..."),
            Self::Connected(_) => f.write_str("Connected to Web Service! (200 OK)"),
            Self::ConnectedWithUnexpectedStatus(code) => {
                write!(f, "Connected but got status: {}", code.as_u16())
            }
            Self::Unreachable => f.write_str("Failed to connect to Web Service"),
        }
    }
}
