//! Single-shot retrieval of a remote still image.

use std::time::Duration;

use async_trait::async_trait;
use sunlapse_common::error::{SunlapseError, SunlapseResult};

/// Timeout applied to one fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for image retrieval backends.
#[async_trait]
pub trait FrameFetcher: Send + Sync {
    /// Retrieve the body at `url`. No retries; any failure is a `Download` error.
    async fn fetch(&self, url: &str) -> SunlapseResult<Vec<u8>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// HTTP(S) fetcher built on a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Fetcher with the standard 10 second timeout.
    pub fn new() -> SunlapseResult<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> SunlapseResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sunlapse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SunlapseError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else if let Some(status) = err.status() {
            format!("HTTP status {status}")
        } else {
            err.to_string()
        }
    }
}

#[async_trait]
impl FrameFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> SunlapseResult<Vec<u8>> {
        tracing::debug!(url, "Fetching image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SunlapseError::download(url, self.describe(&e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SunlapseError::download(url, self.describe(&e)))?;

        tracing::debug!(url, bytes = bytes.len(), "Image fetched");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}
