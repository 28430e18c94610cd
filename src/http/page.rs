//! Status page handler.
//!
//! Every page load mounts a fresh probe, waits for it to settle and renders
//! the result. If the client goes away first, the handler future is dropped
//! and the probe with it, which aborts the probe's request.

use axum::{extract::State, response::Html};

use crate::http::server::AppState;
use crate::probe::StatusProbe;

pub async fn status_page(State(state): State<AppState>) -> Html<String> {
    let mut probe = StatusProbe::mount(state.probe_fetcher.clone(), state.probe_settings.clone());
    let status = probe.settled().await;

    tracing::debug!(probe_id = %probe.id(), status = status.label(), "Rendering status page");
    Html(probe.render())
}
