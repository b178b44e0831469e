//! HTTP fetcher for listing pages
//!
//! This module handles all outbound requests of the crawler:
//! - Building one pooled HTTP client with browser-like headers
//! - Fetching a listing page by index
//! - Classifying failures (timeout, connect, HTTP status, transport)
//!
//! There is no retry; a failed page is reported and skipped for this run.

use crate::config::CrawlerConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use thiserror::Error;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Why a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not connect to {url}: {source}")]
    Connect { url: String, source: reqwest::Error },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
}

impl FetchError {
    fn classify(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            FetchError::Timeout { url }
        } else if error.is_connect() {
            FetchError::Connect { url, source: error }
        } else {
            FetchError::Transport { url, source: error }
        }
    }
}

/// Builds the HTTP client shared by all page fetches
///
/// Gzip and brotli bodies are decoded transparently. The request timeout
/// bounds every fetch, so a stalled server cannot hold a run forever.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    match HeaderValue::from_str(&config.accept_language) {
        Ok(language) => {
            headers.insert(ACCEPT_LANGUAGE, language);
        }
        Err(_) => {
            tracing::warn!(
                value = %config.accept_language,
                "Invalid accept-language, header not sent"
            );
        }
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(config.max_idle_per_host)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing pages by index
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?, config.base_url.clone()))
    }

    /// The page index is appended to the base URL as-is
    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}", self.base_url, page)
    }

    /// Fetches the raw body of one listing page
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<u8>, FetchError> {
        let url = self.page_url(page);
        tracing::debug!(page, url = %url, "fetching listing page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::classify(&url, e))?;

        tracing::trace!(page, bytes = body.len(), "fetched listing page");
        Ok(body.to_vec())
    }
}
