//! Live crawl statistics
//!
//! Counters are plain atomics updated by traversal tasks; a
//! [`CrawlStatistics`] snapshot can be taken at any time, including while
//! the crawl is still running.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counter set shared by every task of one crawl session
#[derive(Debug)]
pub struct CrawlStats {
    started: Instant,
    links_seen: AtomicU64,
    claimed: AtomicU64,
    duplicates: AtomicU64,
    rejected: AtomicU64,
    fetched: AtomicU64,
    discovered: AtomicU64,
    redirected: AtomicU64,
    failed: AtomicU64,
}

/// Which counter an event bumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    /// A link or redirect location entered claim-and-dispatch
    LinkSeen,
    /// The URL won its first-visit claim
    Claimed,
    /// The URL had already been claimed
    Duplicate,
    /// Claimed but refused by the domain filter
    Rejected,
    /// The transport returned a response
    Fetched,
    /// A success response was handed to the discovery observer
    Discovered,
    /// A redirect response was followed
    Redirected,
    /// Any per-URL failure reported to the error observer
    Failed,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            links_seen: AtomicU64::new(0),
            claimed: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            fetched: AtomicU64::new(0),
            discovered: AtomicU64::new(0),
            redirected: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: StatEvent) {
        let counter = match event {
            StatEvent::LinkSeen => &self.links_seen,
            StatEvent::Claimed => &self.claimed,
            StatEvent::Duplicate => &self.duplicates,
            StatEvent::Rejected => &self.rejected,
            StatEvent::Fetched => &self.fetched,
            StatEvent::Discovered => &self.discovered,
            StatEvent::Redirected => &self.redirected,
            StatEvent::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters
    pub fn snapshot(&self) -> CrawlStatistics {
        CrawlStatistics {
            elapsed: self.started.elapsed(),
            links_seen: self.links_seen.load(Ordering::Relaxed),
            claimed: self.claimed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            redirected: self.redirected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Time since the session was built
    pub elapsed: Duration,

    /// Links and redirect locations fed into claim-and-dispatch
    pub links_seen: u64,

    /// Distinct URLs claimed
    pub claimed: u64,

    /// Claims lost to an earlier visitor
    pub duplicates: u64,

    /// Claimed URLs refused by the domain filter
    pub rejected: u64,

    /// Responses received from the transport
    pub fetched: u64,

    /// Pages reported to the discovery observer
    pub discovered: u64,

    /// Redirects followed
    pub redirected: u64,

    /// Per-URL failures
    pub failed: u64,
}

impl CrawlStatistics {
    /// Fetched pages per second since the session started
    pub fn fetch_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.fetched as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Elapsed: {:.2?}", stats.elapsed);
    println!("  Links seen: {}", stats.links_seen);
    println!("  Distinct URLs claimed: {}", stats.claimed);
    println!("  Duplicate links skipped: {}", stats.duplicates);
    println!("  Off-domain URLs rejected: {}", stats.rejected);
    println!();

    println!("Fetching:");
    println!("  Responses: {} ({:.2}/sec)", stats.fetched, stats.fetch_rate());
    println!("  Pages discovered: {}", stats.discovered);
    println!("  Redirects followed: {}", stats.redirected);
    println!("  Failures: {}", stats.failed);
}
