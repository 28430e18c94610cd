//! Outbound request used by the status probe.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use url::Url;

/// Why the probe request did not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid probe URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Issues the probe's GET and reports the response status code.
///
/// Only the status code is inspected; the body is discarded.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self, path: &str) -> Result<StatusCode, FetchError>;
}

/// `StatusFetcher` backed by `reqwest`, resolving paths against a base origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
}

impl HttpFetcher {
    /// Fetcher for `base`, e.g. `http://127.0.0.1:5173`.
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base)?;
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|source| FetchError::Transport {
                url: base.to_string(),
                source,
            })?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl StatusFetcher for HttpFetcher {
    async fn fetch_status(&self, path: &str) -> Result<StatusCode, FetchError> {
        let url = self.base.join(path)?;
        tracing::debug!(url = %url, "Probe request");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(response.status())
    }
}
