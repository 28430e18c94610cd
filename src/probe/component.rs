//! The status probe component.
//!
//! A `StatusProbe` fires its single request from the constructor and owns the
//! task doing it. Dropping the probe aborts the task, so a response that
//! arrives after teardown is discarded with the task instead of reaching a
//! dead instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::observability::metrics;
use crate::probe::fetch::{FetchError, StatusFetcher};
use crate::probe::status::{ConnectionStatus, ProbeOutcome};
use crate::probe::view;

/// What to request and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub path: String,
    pub timeout: Option<Duration>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from(&ProbeConfig::default())
    }
}

impl From<&ProbeConfig> for ProbeSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            path: config.path.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// A mounted probe. Holds the current status and the in-flight request.
#[derive(Debug)]
pub struct StatusProbe {
    id: Uuid,
    status: watch::Receiver<ConnectionStatus>,
    task: JoinHandle<()>,
}

impl StatusProbe {
    /// Mount a probe: status starts at `Checking` and the request is issued
    /// right away. Must be called from within a Tokio runtime.
    pub fn mount(fetcher: Arc<dyn StatusFetcher>, settings: ProbeSettings) -> Self {
        let id = Uuid::new_v4();
        let (tx, status) = watch::channel(ConnectionStatus::Checking);

        let span = tracing::info_span!("probe", probe_id = %id, path = %settings.path);
        let task = tokio::spawn(run_probe(fetcher, settings, tx).instrument(span));

        Self { id, status, task }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that is notified once, when the status settles.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Wait for a terminal status.
    ///
    /// If the request task died without settling, the last known status is
    /// returned.
    pub async fn settled(&mut self) -> ConnectionStatus {
        let settled = self
            .status
            .wait_for(ConnectionStatus::is_terminal)
            .await
            .map(|status| *status);
        settled.unwrap_or_else(|_| *self.status.borrow())
    }

    /// Render the page for the current status.
    pub fn render(&self) -> String {
        view::render_html(&self.status())
    }

    /// Tear the probe down, abandoning any in-flight request.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for StatusProbe {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.task.abort();
            tracing::debug!(probe_id = %self.id, "Probe unmounted before settling, request aborted");
        }
    }
}

async fn run_probe(
    fetcher: Arc<dyn StatusFetcher>,
    settings: ProbeSettings,
    tx: watch::Sender<ConnectionStatus>,
) {
    let started = Instant::now();

    let result = match settings.timeout {
        Some(limit) => tokio::time::timeout(limit, fetcher.fetch_status(&settings.path))
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(limit))),
        None => fetcher.fetch_status(&settings.path).await,
    };
    let outcome = ProbeOutcome::from(result);

    if let ProbeOutcome::Failed(e) = &outcome {
        tracing::error!(error = %e, detail = ?e, "Probe request failed");
    }

    let changed = tx.send_if_modified(|current| {
        let next = current.settle(&outcome);
        if next == *current {
            return false;
        }
        *current = next;
        true
    });

    if changed {
        let status = *tx.borrow();
        metrics::record_probe_outcome(status.label(), started);
        tracing::info!(
            status = status.label(),
            code = status.code().map(|c| c.as_u16()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Probe settled"
        );
    }
}
