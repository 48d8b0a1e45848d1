//! Configuration module for Ripple-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Request timeout: {}s", config.http.timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, RateLimitConfig, UserAgentConfig,
    DEFAULT_CALLS_PER_PERIOD, DEFAULT_PERIOD_MS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};

pub(crate) use validation::validate_domain_pattern;
