//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The pluggable HTTP fetcher capability and its reqwest implementation
//! - HTML link extraction
//! - Rate limiting of outbound fetch calls
//! - Traversal coordination and completion tracking

mod coordinator;
mod fetcher;
mod inflight;
mod parser;
mod scheduler;

pub use coordinator::{Crawler, CrawlerBuilder};
pub use fetcher::{
    build_http_client, FetchFn, FetchResponse, HttpFetcher, ReqwestFetcher,
    STATUS_MOVED_PERMANENTLY, STATUS_OK,
};
pub use parser::{extract_hrefs, HtmlLinkExtractor, LinkExtractor};
pub use scheduler::{RateLimit, RateLimitedFetcher};

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl of `seed` with the production stack from `config`
///
/// `on_discover` receives every successfully fetched URL. Per-URL failures
/// are logged through `tracing`. With `wait-timeout-secs` configured, the
/// function returns `CrawlError::TimeoutExpired` at the deadline.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::Config;
/// use ripple_crawl::crawler::crawl;
///
/// # async fn example() -> ripple_crawl::Result<()> {
/// let crawler = crawl(&Config::default(), "example.com", |url| println!("{}", url)).await?;
/// println!("{:?}", crawler.stats());
/// # Ok(())
/// # }
/// ```
pub async fn crawl<F>(config: &Config, seed: &str, on_discover: F) -> Result<Crawler>
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let crawler = CrawlerBuilder::from_config(config)?
        .on_discover(on_discover)
        .build()?;

    crawler.crawl(seed)?;
    match config.crawler.wait_timeout() {
        Some(timeout) => crawler.wait_timeout(timeout).await?,
        None => crawler.wait().await,
    }

    Ok(crawler)
}
