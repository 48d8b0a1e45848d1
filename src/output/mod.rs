//! Output module for crawl reporting
//!
//! This module handles recording crawl statistics and printing them for the
//! command-line front end.

pub mod stats;

pub use stats::{print_statistics, CrawlStatistics, CrawlStats, StatEvent};
