use serde::Deserialize;
use std::time::Duration;

/// Default number of fetch calls admitted per period
pub const DEFAULT_CALLS_PER_PERIOD: usize = 1000;

/// Default replenishment period (milliseconds)
pub const DEFAULT_PERIOD_MS: u64 = 1000;

/// Main configuration structure for Ripple-Crawl
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub http: HttpConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Wildcard domain patterns to admit; empty means "seed host only"
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Give up waiting after this many seconds (crawl keeps running)
    #[serde(rename = "wait-timeout-secs")]
    pub wait_timeout_secs: Option<u64>,
}

impl CrawlerConfig {
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_secs.map(Duration::from_secs)
    }
}

/// Outbound request rate configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Fetch calls admitted per period; 0 falls back to the default
    #[serde(rename = "calls-per-period")]
    pub calls_per_period: usize,

    /// Replenishment period (milliseconds); 0 falls back to the default
    #[serde(rename = "period-ms")]
    pub period_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls_per_period: DEFAULT_CALLS_PER_PERIOD,
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ripple-crawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// `Name/Version`, followed by `(+ContactURL; ContactEmail)` when any
    /// contact detail is configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Transport configuration for the reqwest-backed fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
