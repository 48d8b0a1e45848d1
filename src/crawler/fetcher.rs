//! HTTP fetcher capability
//!
//! This module defines the transport seam the crawler fetches through and
//! its production implementation:
//! - `HttpFetcher`: pluggable capability returning status, location and body
//! - `FetchFn`: adapter turning an async closure into an `HttpFetcher`
//! - `ReqwestFetcher`: reqwest-backed fetcher with redirects left to the caller
//! - `build_http_client`: client construction from configuration

use crate::config::{Config, HttpConfig, UserAgentConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy, Client};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// HTTP status the crawler treats as a fetched page
pub const STATUS_OK: u16 = 200;

/// HTTP status the crawler follows as a redirect
pub const STATUS_MOVED_PERMANENTLY: u16 = 301;

/// Result of a single fetch call
///
/// The body is owned by the response and released when it is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Raw `Location` header, if the response carried one
    pub location: Option<String>,

    /// Response body; empty for non-success statuses
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A `200` response carrying `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: STATUS_OK,
            location: None,
            body: body.into(),
        }
    }

    /// A `301` response pointing at `location`
    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self {
            status: STATUS_MOVED_PERMANENTLY,
            location: Some(location.into()),
            body: Vec::new(),
        }
    }

    /// A bodiless response with an arbitrary status
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn is_redirect(&self) -> bool {
        self.status == STATUS_MOVED_PERMANENTLY
    }
}

/// Capability that performs the network I/O for one URL
///
/// Implementations must not follow redirects themselves; the crawler
/// routes redirect targets through its own first-visit and domain checks.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<F: HttpFetcher + ?Sized> HttpFetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        (**self).fetch(url).await
    }
}

/// Adapter using a closure as the fetch capability
///
/// The closure receives the URL and returns the response future.
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::{FetchFn, FetchResponse};
/// use ripple_crawl::FetchError;
///
/// let fetcher = FetchFn(|url: String| async move {
///     Ok::<_, FetchError>(FetchResponse::ok(format!("<a href=\"{}\">self</a>", url)))
/// });
/// ```
#[derive(Clone)]
pub struct FetchFn<F>(pub F);

#[async_trait]
impl<F, Fut> HttpFetcher for FetchFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, FetchError>> + Send + 'static,
{
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        (self.0)(url.to_string()).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled so `301` responses reach the crawler intact.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::{HttpConfig, UserAgentConfig};
/// use ripple_crawl::crawler::build_http_client;
///
/// let client =
///     build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Wraps an existing client
    ///
    /// The client should be built with `Policy::none()`; otherwise redirects
    /// are resolved by reqwest and never seen by the crawler.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        build_http_client(&config.user_agent, &config.http).map(Self::new)
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Only success bodies are ever read; anything else is discarded unread
        let body = if status == STATUS_OK {
            response.bytes().await?.to_vec()
        } else {
            Vec::new()
        };

        tracing::trace!(url, status, "fetched");

        Ok(FetchResponse {
            status,
            location,
            body,
        })
    }
}
