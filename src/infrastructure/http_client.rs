//! HTTP client for page fetching
//!
//! A single GET per call with a browser-like user agent. Non-success statuses
//! and transport failures are reported as [`FetchError`]; the client never
//! retries on its own, see [`crate::infrastructure::retry`].

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::config::HttpConfig;

/// Transport failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Other => "transport",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("{kind} error for {url}: {message}")]
    Transport {
        kind: TransportKind,
        url: String,
        message: String,
    },

    #[error("HTTP error {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Only transport failures are worth repeating; a status error is the server's answer
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn transport(kind: TransportKind, url: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            url: url.to_string(),
            message: message.into(),
        }
    }

    fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportKind::Timeout
        } else if error.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        };
        Self::transport(kind, url, error.to_string())
    }
}

/// Fetches a page body. Implemented by [`HttpClient`]; tests provide canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP client with a fixed identification header
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::transport(TransportKind::Other, "<client>", e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    /// Single attempt to fetch HTML content as string
    pub async fn fetch_html_string(&self, url: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        info!("🌐 HTTP GET: {}", url);
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_html_string(url).await
    }
}
