//! Request forwarding to the upstream.
//!
//! # Responsibilities
//! - Look up the proxy route for the inbound path, dot segments resolved
//! - Rewrite `Host` to the upstream authority when the route changes origin
//! - Strip hop-by-hop headers in both directions
//! - Relay method, headers and body; stream the upstream response back
//!
//! # Design Decisions
//! - No retries: an unreachable upstream is a 502, once
//! - Redirects are relayed to the client, never followed here
//! - Routes with `secure = false` use a client that skips certificate checks

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::redirect::Policy;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::ProxyRoute;

/// Largest request body the proxy will buffer before relaying.
pub const MAX_REQUEST_BODY: usize = 32 * 1024 * 1024;

/// Headers that describe a single connection and never cross a proxy.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Upstream HTTP clients, one per TLS policy.
#[derive(Debug, Clone)]
pub struct UpstreamClients {
    verified: reqwest::Client,
    relaxed: reqwest::Client,
}

impl UpstreamClients {
    pub fn new() -> Result<Self, reqwest::Error> {
        let builder = || reqwest::Client::builder().redirect(Policy::none()).no_proxy();
        Ok(Self {
            verified: builder().build()?,
            relaxed: builder().danger_accept_invalid_certs(true).build()?,
        })
    }

    /// Client matching the route's TLS policy.
    pub fn for_route(&self, route: &ProxyRoute) -> &reqwest::Client {
        if route.secure() {
            &self.verified
        } else {
            &self.relaxed
        }
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Prepare inbound headers for the upstream.
///
/// Only `Host` changes (and only when the route changes origin); hop-by-hop
/// headers are dropped.
pub fn rewrite_request_headers(headers: &mut HeaderMap, route: &ProxyRoute) {
    strip_hop_by_hop(headers);
    if route.change_origin() {
        headers.insert(header::HOST, route.authority().clone());
    }
}

/// Fallback handler: forward anything the proxy table matches.
pub async fn forward(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let table = state.table.load_full();

    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let Some((route, url)) = table.resolve(request.uri()) else {
        tracing::debug!(method = %method, path = %path, "No proxy route matched");
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Request body rejected");
            metrics::record_proxy_request(route.prefix(), 413, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let mut headers = parts.headers;
    rewrite_request_headers(&mut headers, route);

    tracing::debug!(
        method = %method,
        path = %path,
        prefix = route.prefix(),
        upstream = %url,
        "Proxying request"
    );

    let result = state
        .clients
        .for_route(route)
        .request(method.clone(), url.clone())
        .headers(headers)
        .body(body)
        .send()
        .await;

    match result {
        Ok(upstream) => {
            let status = upstream.status();
            metrics::record_proxy_request(route.prefix(), status.as_u16(), start);
            tracing::debug!(path = %path, status = %status, "Upstream responded");
            relay_response(upstream)
        }
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %path,
                upstream = %url,
                error = %e,
                "Upstream error"
            );
            metrics::record_proxy_request(route.prefix(), 502, start);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Turn the upstream response into ours: same status, end-to-end headers,
/// streamed body.
fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
