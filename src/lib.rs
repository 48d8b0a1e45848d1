//! Ripple-Crawl: a single-host concurrent web crawler
//!
//! Given a seed address, the crawler fetches the page, extracts outbound links
//! and recursively fetches every link confined to the seed's domain. Each
//! distinct URL is visited at most once and outbound requests are held under
//! a configurable rate.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Ripple-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("No HTTP fetcher configured")]
    ClientMissing,

    #[error("No tokio runtime available to run crawl tasks")]
    NoRuntime,

    #[error("Invalid URL '{url}': {source}")]
    UrlParse { url: String, source: UrlError },

    #[error("Unexpected status {status} for {url}")]
    WrongStatus { url: String, status: u16 },

    #[error("Redirect from {url} has no location")]
    MissingRedirectLocation { url: String },

    #[error("Fetch failed for {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Document parse error for {url}: {source}")]
    DocumentParse { url: String, source: ExtractError },

    #[error("Crawl did not finish within {0:?}")]
    TimeoutExpired(Duration),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl CrawlError {
    /// Returns the URL this failure is attached to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::UrlParse { url, .. }
            | Self::WrongStatus { url, .. }
            | Self::MissingRedirectLocation { url }
            | Self::Fetch { url, .. }
            | Self::DocumentParse { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] ::url::ParseError),

    #[error("Empty URL")]
    Empty,

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Errors surfaced by an [`crawler::HttpFetcher`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by a [`crawler::LinkExtractor`]
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Malformed(String),
}

/// Result type alias for Ripple-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, CrawlerBuilder, HttpFetcher, LinkExtractor, RateLimitedFetcher};
pub use state::TargetState;
pub use storage::VisitStore;
pub use url::{DomainFilter, SessionRoot};
