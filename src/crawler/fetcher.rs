//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a fixed timeout and user agent
//! - GET requests with status validation
//! - Error classification
//! - Parsing response bodies into navigable documents

use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A failed fetch of one URL
#[derive(Debug, Error)]
#[error("Failed to fetch {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            FetchErrorKind::Timeout
        } else if error.is_connect() {
            FetchErrorKind::Connect(error.to_string())
        } else if error.is_decode() {
            FetchErrorKind::Parse(error.to_string())
        } else {
            FetchErrorKind::Transport(error.to_string())
        };
        Self::new(url, kind)
    }
}

/// Source of parsed documents
///
/// The coordinator only talks to the network through this trait, so tests
/// can substitute canned pages.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetches `url` and parses the response into a document
    async fn fetch(&self, url: &str) -> Result<Html, FetchError>;
}

/// Builds an HTTP client with the fixed request timeout
///
/// # Example
///
/// ```no_run
/// use article_archiver::crawler::build_http_client;
///
/// let client = build_http_client("article-archiver/0.1").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
        })
    }
}

impl Fetcher for HttpFetcher {
    /// Fetches a URL and parses it as HTML
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Status in [200, 300) | Parsed document |
    /// | Any other status | `Status(code)`, body drained |
    /// | Timeout (5s) | `Timeout` |
    /// | DNS / refused connection | `Connect` |
    /// | Body cannot be decoded | `Parse` |
    async fn fetch(&self, url: &str) -> Result<Html, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            // Drain so the connection goes back to the pool
            let _ = response.bytes().await;
            return Err(FetchError::new(url, FetchErrorKind::Status(status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        tracing::debug!(%url, bytes = body.len(), "Fetched document");
        Ok(Html::parse_document(&body))
    }
}
