//! Upstream image fetching

use crate::error::{RelayError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the configured upstream image host.
pub struct ImageFetcher {
    client: Client,
    base_url: String,
}

/// A validated upstream response, ready for ingestion.
#[derive(Debug)]
pub struct UpstreamImage {
    pub content_type: String,
    pub declared_len: Option<u64>,
    pub response: reqwest::Response,
}

impl ImageFetcher {
    /// Create a fetcher for `base_url` with a total-request timeout
    /// covering connect through body streaming.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("image-relay/0.1")
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the upstream URL for a request target.
    ///
    /// The target (path plus query) is appended verbatim to the configured
    /// base; anything that does not parse as an http(s) URL is rejected.
    pub fn upstream_url(&self, target: &str) -> Result<Url> {
        let joined = format!("{}{}", self.base_url, target);
        let url = Url::parse(&joined)
            .map_err(|e| RelayError::InvalidRequest(format!("{}: {}", joined, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RelayError::InvalidRequest(format!(
                "Unsupported scheme: {}",
                other
            ))),
        }
    }

    /// GET an image from upstream, gating on status and content type.
    ///
    /// The response body has not been read when this returns; the caller
    /// decides whether to stream it into the cache.
    pub async fn fetch(&self, target: &str) -> Result<UpstreamImage> {
        let url = self.upstream_url(target)?;
        debug!(url = %url, "Fetching from upstream");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(RelayError::UpstreamType(content_type));
        }

        let declared_len = response.content_length();
        debug!(
            content_type = %content_type,
            declared_len,
            "Upstream response accepted"
        );

        Ok(UpstreamImage {
            content_type,
            declared_len,
            response,
        })
    }
}
