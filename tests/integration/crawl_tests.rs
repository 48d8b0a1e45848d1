//! Integration tests for the crawler
//!
//! Most tests drive the crawler through an in-memory fake site (or a
//! closure fetcher) so fetch counts can be asserted exactly. The wiremock
//! tests run the real reqwest fetcher end-to-end against a mock HTTP server.

use async_trait::async_trait;
use ripple_crawl::config::Config;
use ripple_crawl::crawler::{
    crawl, Crawler, FetchFn, FetchResponse, HttpFetcher, RateLimit, RateLimitedFetcher,
    ReqwestFetcher,
};
use ripple_crawl::storage::{MemoryVisitStore, ShardedVisitStore, VisitStore};
use ripple_crawl::{CrawlError, FetchError};
use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory site keyed by absolute URL, recording every fetch
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, FetchResponse>,
    delay: Duration,
    fetched: Mutex<HashMap<String, usize>>,
    started: Mutex<Vec<Instant>>,
}

impl FakeSite {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages
            .insert(url.to_string(), FetchResponse::ok(html.as_bytes()));
        self
    }

    fn redirect(mut self, url: &str, location: &str) -> Self {
        self.pages
            .insert(url.to_string(), FetchResponse::moved_permanently(location));
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn fetched(&self) -> HashMap<String, usize> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.started.lock().unwrap().push(Instant::now());
        *self
            .fetched
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::ok("")))
    }
}

/// Collects discovery callbacks: url -> times reported
fn discovery_recorder() -> (
    Arc<Mutex<HashMap<String, usize>>>,
    impl Fn(&str) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(HashMap::new()));
    let sink = Arc::clone(&seen);
    (seen, move |url: &str| {
        *sink.lock().unwrap().entry(url.to_string()).or_default() += 1;
    })
}

fn small_site() -> FakeSite {
    FakeSite::default()
        .redirect("http://domain.com/", "http://domain.com/index.html")
        .page(
            "http://domain.com/index.html",
            r#"
            <a href="http://domain.com/1.html" />
            <a href="http://domain.com/2.html" />
            <a href="http://domain.com/3.html" />
            "#,
        )
        .page(
            "http://domain.com/1.html",
            r#"
            <a href="http://domain.com/index.html" />
            <a href="http://domain.com/2.html" />
            <a href="http://domain.com/3.html" />

            <a href="http://domain.com/cat.html" />
            "#,
        )
        .page(
            "http://domain.com/2.html",
            r#"
            <a href="http://domain.com/1.html" />
            <a href="http://domain.com/index.html" />
            <a href="http://domain.com/3.html" />

            <a href="http://domain.com/cat.html" />
            <a href="http://domain.com/dog.html" />
            "#,
        )
        .page(
            "http://domain.com/3.html",
            r#"
            <a href="http://domain.com/1.html" />
            <a href="http://domain.com/2.html" />
            <a href="http://domain.com/index.html" />

            <a href="http://domain.com/about.html" />
            <a href="http://myspace.com/sponsor.html" />
            "#,
        )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_walk_all_links_only_once() {
    let site = Arc::new(small_site());
    let (discovered, on_discover) = discovery_recorder();

    let crawler = Crawler::builder()
        .fetcher(Arc::clone(&site))
        .visit_store(MemoryVisitStore::new())
        .on_discover(on_discover)
        .build()
        .unwrap();

    crawler.crawl("http://domain.com/").unwrap();
    crawler.wait_timeout(Duration::from_secs(1)).await.unwrap();

    let fetched = site.fetched();
    assert_eq!(fetched.len(), 8, "fetched: {:?}", fetched);
    for (url, count) in &fetched {
        assert_eq!(*count, 1, "{} fetched {} times", url, count);
    }
    assert!(!fetched.contains_key("http://myspace.com/sponsor.html"));

    let discovered = discovered.lock().unwrap();
    assert_eq!(discovered.len(), 7, "discovered: {:?}", discovered);
    for (url, count) in discovered.iter() {
        assert_eq!(*count, 1, "{} discovered {} times", url, count);
    }
    assert!(!discovered.contains_key("http://domain.com/"));

    let stats = crawler.stats();
    assert_eq!(stats.fetched, 8);
    assert_eq!(stats.discovered, 7);
    assert_eq!(stats.redirected, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(crawler.in_flight(), 0);
}

#[tokio::test]
async fn test_seed_without_scheme() {
    let site = Arc::new(small_site());
    let crawler = Crawler::builder()
        .fetcher(Arc::clone(&site))
        .build()
        .unwrap();

    crawler.crawl("domain.com/").unwrap();
    crawler.wait_timeout(Duration::from_secs(1)).await.unwrap();

    assert_eq!(crawler.root_domain(), Some("domain.com"));
    assert_eq!(site.fetched().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_redirect_cycles_fetch_each_url_once() {
    // /a -> /b (301), /b links back to /a and to /c, /c -> /a (301),
    // /b links to itself through a relative href as well
    let fetched = Arc::new(Mutex::new(HashMap::<String, usize>::new()));
    let log = Arc::clone(&fetched);
    let site = FetchFn(move |url: String| {
        *log.lock().unwrap().entry(url.clone()).or_default() += 1;
        async move {
            Ok::<_, FetchError>(match url.as_str() {
                "http://domain.com/a" => FetchResponse::moved_permanently("/b"),
                "http://domain.com/b" => FetchResponse::ok(
                    r#"<a href="/a">a</a><a href="c">c</a><a href="/b">self</a>"#,
                ),
                "http://domain.com/c" => FetchResponse::moved_permanently("http://domain.com/a"),
                _ => FetchResponse::with_status(404),
            })
        }
    });
    let (discovered, on_discover) = discovery_recorder();
    let crawler = Crawler::builder()
        .fetcher(site)
        .visit_store(ShardedVisitStore::new())
        .on_discover(on_discover)
        .build()
        .unwrap();

    crawler.crawl("http://domain.com/a").unwrap();
    crawler.wait_timeout(Duration::from_secs(1)).await.unwrap();

    let fetched = fetched.lock().unwrap();
    assert_eq!(fetched.len(), 3);
    assert!(fetched.values().all(|count| *count == 1));

    // Redirect sources are never discovered, only the page they lead to
    let discovered = discovered.lock().unwrap();
    assert_eq!(discovered.len(), 1);
    assert_eq!(discovered.get("http://domain.com/b"), Some(&1));
}

#[tokio::test]
async fn test_off_domain_links_claimed_not_fetched() {
    let site = Arc::new(
        FakeSite::default()
            .page(
                "http://domain.com/",
                r#"<a href="http://myspace.com/sponsor.html">x</a><a href="/next.html">n</a>"#,
            )
            .page(
                "http://domain.com/next.html",
                r#"<a href="http://myspace.com/sponsor.html">again</a>"#,
            ),
    );
    let (discovered, on_discover) = discovery_recorder();
    let crawler = Crawler::builder()
        .fetcher(Arc::clone(&site))
        .on_discover(on_discover)
        .build()
        .unwrap();

    crawler.crawl("http://domain.com/").unwrap();
    crawler.wait_timeout(Duration::from_secs(1)).await.unwrap();

    assert!(!site.fetched().contains_key("http://myspace.com/sponsor.html"));
    assert!(!discovered
        .lock()
        .unwrap()
        .contains_key("http://myspace.com/sponsor.html"));

    // Rejected once, then seen as already claimed on the second page
    let stats = crawler.stats();
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(crawler.visited_count(), 3);
}

#[tokio::test]
async fn test_wait_timeout_does_not_cancel_crawl() {
    let site = Arc::new(
        FakeSite::default()
            .page("http://domain.com/", r#"<a href="/slow.html">slow</a>"#)
            .slow(Duration::from_millis(200)),
    );
    let crawler = Crawler::builder()
        .fetcher(Arc::clone(&site))
        .build()
        .unwrap();

    crawler.crawl("http://domain.com/").unwrap();

    let result = crawler.wait_timeout(Duration::from_millis(10)).await;
    assert!(matches!(result, Err(CrawlError::TimeoutExpired(_))));
    assert!(crawler.in_flight() > 0);

    crawler.wait_timeout(Duration::from_secs(5)).await.unwrap();
    assert_eq!(crawler.in_flight(), 0);
    assert_eq!(site.fetched().len(), 2);
}

#[tokio::test]
async fn test_tasks_outlive_dropped_handle() {
    let site = Arc::new(
        FakeSite::default()
            .page("http://domain.com/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .slow(Duration::from_millis(50)),
    );
    let crawler = Crawler::builder()
        .fetcher(Arc::clone(&site))
        .build()
        .unwrap();

    let observer = crawler.clone();
    crawler.crawl("http://domain.com/").unwrap();
    assert!(crawler.wait_timeout(Duration::from_millis(1)).await.is_err());
    drop(crawler);

    observer.wait_timeout(Duration::from_secs(5)).await.unwrap();
    assert_eq!(site.fetched().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rate_limit_caps_fetch_starts_per_period() {
    const PAGES: usize = 12;
    const CALLS: usize = 4;
    let period = Duration::from_millis(300);

    let links: String = (0..PAGES)
        .map(|i| format!(r#"<a href="/p{}.html">{}</a>"#, i, i))
        .collect();
    let site = Arc::new(FakeSite::default().page("http://domain.com/", &links));
    let limited =
        RateLimitedFetcher::new(Arc::clone(&site), RateLimit::new(CALLS, period)).unwrap();

    assert_eq!(limited.limit().calls_per_period(), CALLS);
    assert_eq!(limited.limit().period(), period);

    let crawler = Crawler::builder().fetcher(limited).build().unwrap();
    let begin = Instant::now();
    crawler.crawl("http://domain.com/").unwrap();
    crawler.wait_timeout(Duration::from_secs(5)).await.unwrap();

    let mut started = site.started.lock().unwrap().clone();
    started.sort();
    assert_eq!(started.len(), PAGES + 1);

    // Any CALLS + 1 consecutive starts must span roughly a full period
    let slack = period / 5;
    for window in started.windows(CALLS + 1) {
        let span = window[CALLS].duration_since(window[0]);
        assert!(
            span + slack >= period,
            "{} fetches began within {:?}",
            CALLS + 1,
            span
        );
    }
    // 13 calls at 4 per period need three refills
    assert!(begin.elapsed() + slack >= period * 3);
}

#[test]
fn test_concurrent_claims_single_winner_for_every_store() {
    const THREADS: usize = 16;
    const URLS: usize = 200;

    let stores: Vec<Arc<dyn VisitStore>> = vec![
        Arc::new(MemoryVisitStore::new()),
        Arc::new(ShardedVisitStore::new()),
    ];

    for store in stores {
        let barrier = Arc::new(Barrier::new(THREADS));
        let wins = Arc::new(Mutex::new(HashMap::<usize, usize>::new()));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    barrier.wait();
                    for i in 0..URLS {
                        if store.try_claim(&format!("http://domain.com/{}", i)) {
                            *wins.lock().unwrap().entry(i).or_default() += 1;
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let wins = wins.lock().unwrap();
        assert_eq!(wins.len(), URLS);
        assert!(wins.values().all(|w| *w == 1));
        assert_eq!(store.len(), URLS);
    }
}

#[tokio::test]
async fn test_reqwest_fetcher_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/home"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><body>
                    <a href="/page1">Page 1</a>
                    <a href="page2">Page 2</a>
                    <a href="/missing">Missing</a>
                    <a href="https://elsewhere.example/">Elsewhere</a>
                    </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/home">back</a>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>leaf</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (discovered, on_discover) = discovery_recorder();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);

    let fetcher = ReqwestFetcher::from_config(&Config::default()).unwrap();
    let crawler = Crawler::builder()
        .fetcher(fetcher)
        .on_discover(on_discover)
        .on_error(move |e: &CrawlError| {
            sink.lock()
                .unwrap()
                .push((e.url().map(str::to_string), e.to_string()))
        })
        .build()
        .unwrap();

    crawler.crawl(&format!("{}/", base_url)).unwrap();
    crawler.wait_timeout(Duration::from_secs(10)).await.unwrap();

    let discovered = discovered.lock().unwrap();
    let mut pages: Vec<_> = discovered.keys().cloned().collect();
    pages.sort();
    assert_eq!(
        pages,
        vec![
            format!("{}/home", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, Some(format!("{}/missing", base_url)));
    assert!(errors[0].1.contains("404"));

    // Expectations (each path requested exactly once) are verified on drop
    drop(mock_server);
}

#[tokio::test]
async fn test_crawl_with_config_stack() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/about">About</a>"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string("about"))
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.rate_limit.calls_per_period = 1;
    config.rate_limit.period_ms = 50;
    config.crawler.wait_timeout_secs = Some(10);

    let (discovered, on_discover) = discovery_recorder();
    let crawler = crawl(&config, &base_url, on_discover).await.unwrap();

    assert_eq!(discovered.lock().unwrap().len(), 2);
    assert_eq!(crawler.stats().fetched, 2);
    assert_eq!(crawler.in_flight(), 0);
}
