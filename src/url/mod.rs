//! URL handling module for Ripple-Crawl
//!
//! This module provides seed parsing, crawl-target resolution, domain
//! extraction, wildcard matching and the domain filter that decides which
//! targets a session fetches.

mod domain;
mod matcher;
mod normalize;

use crate::config::{validate_domain_pattern, CrawlerConfig};
use crate::{ConfigError, UrlError};
use std::fmt;
use std::sync::Arc;
use url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::{parse_seed, resolve_target};

/// Scheme and root domain of a crawl session
///
/// Fixed by the first seed and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRoot {
    scheme: String,
    domain: String,
    base: Url,
}

impl SessionRoot {
    /// Builds the session root from an already parsed seed
    pub fn from_seed(seed: &Url) -> Result<Self, UrlError> {
        let domain = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        let base = Url::parse(&format!("{}://{}/", seed.scheme(), domain))?;
        Ok(Self {
            scheme: seed.scheme().to_string(),
            domain,
            base,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The root domain (host, plus port when explicit)
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `scheme://domain/`, the base relative hrefs resolve against
    pub fn base(&self) -> &Url {
        &self.base
    }
}

/// Predicate deciding which crawl targets get fetched
#[derive(Clone, Default)]
pub enum DomainFilter {
    /// Admit only targets whose domain equals the session root domain
    #[default]
    SameHost,

    /// Admit targets whose domain matches any of these wildcard patterns
    Patterns(Vec<String>),

    /// Caller-supplied predicate
    Custom(Arc<dyn Fn(&Url) -> bool + Send + Sync>),
}

impl DomainFilter {
    /// Wraps a closure as a custom filter
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Builds the filter described by the crawler configuration
    ///
    /// An empty `allowed-domains` list means same-host crawling.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        if config.allowed_domains.is_empty() {
            return Ok(Self::SameHost);
        }
        for pattern in &config.allowed_domains {
            validate_domain_pattern(pattern)?;
        }
        Ok(Self::Patterns(config.allowed_domains.clone()))
    }

    /// Returns true if `target` should be fetched in a session rooted at `root`
    pub fn admits(&self, target: &Url, root: &SessionRoot) -> bool {
        match self {
            Self::SameHost => extract_domain(target).as_deref() == Some(root.domain()),
            Self::Patterns(patterns) => extract_domain(target).is_some_and(|domain| {
                patterns.iter().any(|p| matches_wildcard(p, &domain))
            }),
            Self::Custom(predicate) => predicate(target),
        }
    }
}

impl fmt::Debug for DomainFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameHost => f.write_str("SameHost"),
            Self::Patterns(patterns) => f.debug_tuple("Patterns").field(patterns).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
