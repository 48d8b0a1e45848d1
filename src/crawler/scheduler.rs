//! Rate-limited fetching
//!
//! This module gates calls into an [`HttpFetcher`] behind a permit pool:
//! - The pool holds at most `calls_per_period` permits and starts full
//! - Each fetch call consumes one permit before touching the transport
//! - A background task tops the pool back up once per period, starting one
//!   period after construction
//!
//! Unused permits do not carry over: the top-up only refills to capacity, so
//! no more than `calls_per_period` calls start within one period.

use crate::config::{RateLimitConfig, DEFAULT_CALLS_PER_PERIOD, DEFAULT_PERIOD_MS};
use crate::crawler::{FetchResponse, HttpFetcher};
use crate::{CrawlError, FetchError};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Resolved rate limit: `calls_per_period` fetch starts per `period`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    calls_per_period: usize,
    period: Duration,
}

impl RateLimit {
    /// Resolves a rate limit, substituting defaults for zero values
    ///
    /// Zero calls becomes 1000, a zero period becomes one second.
    pub fn new(calls_per_period: usize, period: Duration) -> Self {
        let calls_per_period = if calls_per_period == 0 {
            DEFAULT_CALLS_PER_PERIOD
        } else {
            calls_per_period.min(Semaphore::MAX_PERMITS)
        };
        let period = if period.is_zero() {
            Duration::from_millis(DEFAULT_PERIOD_MS)
        } else {
            period
        };

        Self {
            calls_per_period,
            period,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.calls_per_period,
            Duration::from_millis(config.period_ms),
        )
    }

    pub fn calls_per_period(&self) -> usize {
        self.calls_per_period
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

/// Fetcher wrapper admitting at most N calls per period
///
/// The replenisher task is started on construction and stops when the
/// fetcher is dropped.
pub struct RateLimitedFetcher<F> {
    inner: F,
    permits: Arc<Semaphore>,
    limit: RateLimit,
    replenisher: JoinHandle<()>,
}

impl<F: HttpFetcher> RateLimitedFetcher<F> {
    /// Wraps `inner`, starting the replenisher on the current tokio runtime
    pub fn new(inner: F, limit: RateLimit) -> Result<Self, CrawlError> {
        let handle = Handle::try_current().map_err(|_| CrawlError::NoRuntime)?;
        Ok(Self::with_handle(inner, limit, &handle))
    }

    /// Wraps `inner`, starting the replenisher on the given runtime
    pub fn with_handle(inner: F, limit: RateLimit, handle: &Handle) -> Self {
        let permits = Arc::new(Semaphore::new(limit.calls_per_period));
        let replenisher = handle.spawn(replenish(
            Arc::downgrade(&permits),
            limit.calls_per_period,
            limit.period,
        ));

        Self {
            inner,
            permits,
            limit,
            replenisher,
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Permits left in the current period
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: HttpFetcher> HttpFetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FetchError::Other("rate limiter closed".to_string()))?;
        // Consumed for good; only the replenisher hands permits back
        permit.forget();

        self.inner.fetch(url).await
    }
}

impl<F> Drop for RateLimitedFetcher<F> {
    fn drop(&mut self) {
        self.replenisher.abort();
    }
}

/// Refills the pool once per period until the pool is dropped
async fn replenish(permits: Weak<Semaphore>, capacity: usize, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The pool starts full; the first refill is due one period from now
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(permits) = permits.upgrade() else {
            break;
        };
        let added = top_up(&permits, capacity);
        if added > 0 {
            tracing::trace!(added, "Rate limit permits replenished");
        }
    }
}

/// Adds permits until `capacity` are available, returning how many were added
///
/// Only the replenisher adds permits and fetch callers only remove them, so
/// the available count can only drop between the read and the add.
fn top_up(permits: &Semaphore, capacity: usize) -> usize {
    let missing = capacity.saturating_sub(permits.available_permits());
    if missing > 0 {
        permits.add_permits(missing);
    }
    missing
}
