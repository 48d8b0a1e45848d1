//! Crawler coordinator - traversal orchestration
//!
//! A crawl session turns one seed into a self-terminating fan-out of tasks:
//! - Every link goes through claim-and-dispatch: resolve, claim, filter, spawn
//! - Each spawned task fetches through the (rate-limited) fetcher
//! - `200` pages are reported and their links dispatched recursively
//! - `301` locations re-enter claim-and-dispatch like any discovered link
//! - Everything else is reported to the error observer and the branch stops
//!
//! The coordinator holds no lock of its own. Exactly-once visiting comes from
//! the visit store's atomic claim, completion from the in-flight counter.

use crate::config::Config;
use crate::crawler::inflight::InFlight;
use crate::crawler::{
    HtmlLinkExtractor, HttpFetcher, LinkExtractor, RateLimit, RateLimitedFetcher, ReqwestFetcher,
    STATUS_MOVED_PERMANENTLY, STATUS_OK,
};
use crate::output::{CrawlStatistics, CrawlStats, StatEvent};
use crate::state::TargetState;
use crate::storage::{MemoryVisitStore, VisitStore};
use crate::url::{parse_seed, resolve_target, DomainFilter, SessionRoot};
use crate::{CrawlError, Result};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

type DiscoveryObserver = Arc<dyn Fn(&str) + Send + Sync>;
type ErrorObserver = Arc<dyn Fn(&CrawlError) + Send + Sync>;

/// Explicit configuration for a crawl session
///
/// Everything is resolved once in [`CrawlerBuilder::build`]; a built
/// [`Crawler`] never fills in defaults lazily.
#[derive(Default)]
pub struct CrawlerBuilder {
    fetcher: Option<Arc<dyn HttpFetcher>>,
    extractor: Option<Arc<dyn LinkExtractor>>,
    visit_store: Option<Arc<dyn VisitStore>>,
    filter: DomainFilter,
    on_discover: Option<DiscoveryObserver>,
    on_error: Option<ErrorObserver>,
    runtime: Option<Handle>,
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for the production stack described by `config`
    ///
    /// Uses a reqwest fetcher wrapped in a [`RateLimitedFetcher`] and the
    /// configured domain filter. Must be called inside a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CrawlError::NoRuntime)?;
        let transport = ReqwestFetcher::from_config(config)?;
        let limit = RateLimit::from_config(&config.rate_limit);
        let fetcher = RateLimitedFetcher::with_handle(transport, limit, &runtime);
        tracing::info!(
            calls_per_period = fetcher.limit().calls_per_period(),
            period = ?fetcher.limit().period(),
            "Outbound fetches rate limited"
        );

        Ok(Self::new()
            .fetcher(fetcher)
            .domain_filter(DomainFilter::from_config(&config.crawler)?)
            .runtime(runtime))
    }

    /// Sets the fetch capability (required)
    pub fn fetcher<F: HttpFetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Sets the link extractor (default: [`HtmlLinkExtractor`])
    pub fn extractor<E: LinkExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Sets the visit store (default: [`MemoryVisitStore`])
    pub fn visit_store<S: VisitStore + 'static>(mut self, store: S) -> Self {
        self.visit_store = Some(Arc::new(store));
        self
    }

    /// Sets the domain filter (default: [`DomainFilter::SameHost`])
    pub fn domain_filter(mut self, filter: DomainFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Called once per successfully fetched URL, from the fetching task
    pub fn on_discover<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_discover = Some(Arc::new(observer));
        self
    }

    /// Called once per per-URL failure, from the task that hit it
    pub fn on_error<F>(mut self, observer: F) -> Self
    where
        F: Fn(&CrawlError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(observer));
        self
    }

    /// Runtime traversal tasks are spawned on (default: the current one)
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validates the configuration and creates the session
    ///
    /// # Errors
    ///
    /// * `CrawlError::ClientMissing` - no fetcher was configured
    /// * `CrawlError::NoRuntime` - no runtime given and none current
    pub fn build(self) -> Result<Crawler> {
        let fetcher = self.fetcher.ok_or(CrawlError::ClientMissing)?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| CrawlError::NoRuntime)?,
        };

        Ok(Crawler {
            inner: Arc::new(Session {
                fetcher,
                extractor: self
                    .extractor
                    .unwrap_or_else(|| Arc::new(HtmlLinkExtractor::new())),
                visited: self
                    .visit_store
                    .unwrap_or_else(|| Arc::new(MemoryVisitStore::new())),
                filter: self.filter,
                on_discover: self.on_discover,
                on_error: self.on_error,
                root: OnceLock::new(),
                in_flight: InFlight::new(),
                stats: CrawlStats::new(),
                runtime,
            }),
        })
    }
}

/// Handle to one crawl session
///
/// Cloning is cheap and every clone drives the same session. Tasks own a
/// reference to the session, so they keep running safely after a caller
/// stops waiting or drops its handle.
#[derive(Clone)]
pub struct Crawler {
    inner: Arc<Session>,
}

struct Session {
    fetcher: Arc<dyn HttpFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    visited: Arc<dyn VisitStore>,
    filter: DomainFilter,
    on_discover: Option<DiscoveryObserver>,
    on_error: Option<ErrorObserver>,
    root: OnceLock<SessionRoot>,
    in_flight: Arc<InFlight>,
    stats: CrawlStats,
    runtime: Handle,
}

impl Crawler {
    pub fn builder() -> CrawlerBuilder {
        CrawlerBuilder::new()
    }

    /// Starts crawling from `seed` and returns immediately
    ///
    /// The first successful call fixes the session's scheme and root domain;
    /// later calls reuse them whatever host they name. Only seed validation
    /// fails here. Failures further down are sent to the error observer.
    ///
    /// # Errors
    ///
    /// * `CrawlError::UrlParse` - the seed is malformed
    pub fn crawl(&self, seed: &str) -> Result<()> {
        let url = parse_seed(seed).map_err(|source| CrawlError::UrlParse {
            url: seed.to_string(),
            source,
        })?;

        let root = match self.inner.root.get() {
            Some(root) => root,
            None => {
                let candidate =
                    SessionRoot::from_seed(&url).map_err(|source| CrawlError::UrlParse {
                        url: seed.to_string(),
                        source,
                    })?;
                self.inner.root.get_or_init(|| candidate)
            }
        };

        tracing::info!(
            seed = %url,
            scheme = root.scheme(),
            root = root.domain(),
            "Starting crawl"
        );
        self.inner.dispatch(url);
        Ok(())
    }

    /// Waits until every spawned task, and all of their descendants, finished
    pub async fn wait(&self) {
        self.inner.in_flight.wait_idle().await;
        tracing::info!(stats = ?self.stats(), "Crawl complete");
    }

    /// Like [`Crawler::wait`], giving up after `timeout`
    ///
    /// Giving up does not cancel anything: the crawl keeps running and can be
    /// waited on again.
    ///
    /// # Errors
    ///
    /// * `CrawlError::TimeoutExpired` - tasks were still in flight at the deadline
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| CrawlError::TimeoutExpired(timeout))
    }

    /// Number of traversal tasks currently outstanding
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.current()
    }

    /// The session's root domain, once the first seed has been accepted
    pub fn root_domain(&self) -> Option<&str> {
        self.inner.root.get().map(SessionRoot::domain)
    }

    /// Number of distinct URLs claimed so far
    pub fn visited_count(&self) -> usize {
        self.inner.visited.len()
    }

    pub fn stats(&self) -> CrawlStatistics {
        self.inner.stats.snapshot()
    }
}

impl Session {
    /// Claim-and-dispatch for a raw href or redirect location
    fn dispatch_href(self: &Arc<Self>, href: &str) {
        let Some(root) = self.root.get() else {
            tracing::debug!(href, "No session root yet, dropping link");
            return;
        };

        match resolve_target(href, root) {
            Ok(url) => self.dispatch(url),
            Err(source) => {
                self.stats.record(StatEvent::LinkSeen);
                self.report(CrawlError::UrlParse {
                    url: href.to_string(),
                    source,
                });
            }
        }
    }

    /// Claim-and-dispatch for a resolved target
    fn dispatch(self: &Arc<Self>, target: Url) {
        self.stats.record(StatEvent::LinkSeen);

        if !self.visited.try_claim(target.as_str()) {
            self.stats.record(StatEvent::Duplicate);
            tracing::trace!(url = %target, "Already claimed");
            return;
        }
        self.stats.record(StatEvent::Claimed);
        let mut state = TargetState::Discovered;
        advance(&mut state, TargetState::Claimed, target.as_str());

        let admitted = self
            .root
            .get()
            .is_some_and(|root| self.filter.admits(&target, root));
        if !admitted {
            // Stays claimed, so no other path can bring it back
            self.stats.record(StatEvent::Rejected);
            advance(&mut state, TargetState::Rejected, target.as_str());
            return;
        }

        // Counted before the spawn so the parent's release cannot hit zero first
        let guard = self.in_flight.acquire();
        let session = Arc::clone(self);
        self.runtime.spawn(async move {
            let _guard = guard;
            session.visit(target, state).await;
        });
    }

    async fn visit(self: Arc<Self>, target: Url, mut state: TargetState) {
        let url = target.as_str();
        advance(&mut state, TargetState::Fetching, url);

        match self.fetch_and_extract(&target, &mut state).await {
            Ok(()) => advance(&mut state, TargetState::Completed, url),
            Err(err) => {
                advance(&mut state, TargetState::Failed, url);
                self.report(err);
            }
        }
    }

    async fn fetch_and_extract(
        self: &Arc<Self>,
        target: &Url,
        state: &mut TargetState,
    ) -> Result<()> {
        let url = target.as_str();
        let response = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| CrawlError::Fetch {
                url: url.to_string(),
                source,
            })?;
        self.stats.record(StatEvent::Fetched);

        match response.status {
            STATUS_OK => {
                advance(state, TargetState::Extracting, url);
                self.stats.record(StatEvent::Discovered);
                if let Some(on_discover) = &self.on_discover {
                    on_discover(url);
                }

                let hrefs =
                    self.extractor
                        .extract(&response.body)
                        .map_err(|source| CrawlError::DocumentParse {
                            url: url.to_string(),
                            source,
                        })?;
                drop(response);

                tracing::debug!(url, links = hrefs.len(), "Extracted links");
                for href in &hrefs {
                    self.dispatch_href(href);
                }
                Ok(())
            }

            STATUS_MOVED_PERMANENTLY => {
                let location = response
                    .location
                    .as_deref()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| CrawlError::MissingRedirectLocation {
                        url: url.to_string(),
                    })?;
                // Relative locations resolve against the redirecting URL
                let next = target.join(location).map_err(|e| CrawlError::UrlParse {
                    url: location.to_string(),
                    source: e.into(),
                })?;

                advance(state, TargetState::Redirecting, url);
                self.stats.record(StatEvent::Redirected);
                tracing::debug!(from = url, to = %next, "Following redirect");
                self.dispatch_href(next.as_str());
                Ok(())
            }

            status => Err(CrawlError::WrongStatus {
                url: url.to_string(),
                status,
            }),
        }
    }

    fn report(&self, err: CrawlError) {
        self.stats.record(StatEvent::Failed);
        tracing::warn!(error = %err, "Crawl target failed");
        if let Some(on_error) = &self.on_error {
            on_error(&err);
        }
    }
}

fn advance(state: &mut TargetState, next: TargetState, url: &str) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal transition {} -> {} for {}",
        state,
        next,
        url
    );
    tracing::trace!(url, from = %state, to = %next, "Target state");
    *state = next;
}
