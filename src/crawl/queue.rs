// src/crawl/queue.rs
// =============================================================================
// This module implements the crawl loop, breadth-first and bounded.
//
// How it works:
// 1. Normalize the seed; its host becomes the crawl's scope
// 2. Pop the next URL off the frontier (skipping ones already attempted)
// 3. Fetch it; a failed fetch still counts as a visited page
// 4. Extract text records and in-scope links from the page
// 5. Queue links while visited + queued stays under the page limit
// 6. Repeat until the frontier is empty or the page limit is reached
//
// Fetches happen one at a time. The only thing that can interrupt a crawl is
// its cancellation token or deadline, and even then the records collected so
// far are returned.
//
// Rust concepts:
// - async/await: every fetch is awaited before the next one starts
// - tokio::select!: races the fetch against cancellation and the deadline,
//   and drops whichever futures lose
// - let-else: `let Some(x) = ... else { break; };` unwraps or leaves the loop
// - Borrowing: `extract` only borrows the visited set, the loop owns it
// =============================================================================

use std::num::NonZeroUsize;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::frontier::CrawlState;
use crate::config::CrawlConfig;
use crate::error::{CrawlError, InvalidUrl};
use crate::page::{extract, is_markup, normalize, Extracted, PageFetcher, ScrapedRecord, Scope};

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Nothing left in the frontier
    Completed,
    /// The page limit was reached
    Exhausted,
    /// The deadline passed or the caller cancelled
    Cancelled,
}

/// Everything one crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Records in the order they were found
    pub records: Vec<ScrapedRecord>,
    /// Fetch attempts made, failed ones included
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub stop_reason: StopReason,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A configured crawler.
///
/// The crawler itself holds no crawl state: each call to `run` builds its own
/// frontier and visited set, so a single `Crawler` can serve any number of
/// concurrent crawls.
#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: PageFetcher,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let fetcher = PageFetcher::new(&config).map_err(CrawlError::Client)?;
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Copy of this crawler with another page limit, sharing the HTTP client.
    pub fn with_max_pages(&self, max_pages: NonZeroUsize) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            config: self.config.clone().with_max_pages(max_pages),
        }
    }

    /// Crawls from `seed` until the frontier drains or the page limit is hit.
    pub async fn run(&self, seed: &str) -> Result<CrawlResult, InvalidUrl> {
        self.run_with_cancel(seed, CancellationToken::new()).await
    }

    // Same as `run`, but stops early once `cancel` fires or the configured
    // deadline passes. The page being fetched at that moment counts as
    // visited and contributes nothing.
    //
    // Only a bad seed is an error. Per-page failures are logged and absorbed.
    pub async fn run_with_cancel(
        &self,
        seed: &str,
        cancel: CancellationToken,
    ) -> Result<CrawlResult, InvalidUrl> {
        // A seed that can't be normalized is the only hard error
        let seed = normalize(seed, None)?;
        let scope = Scope::from_seed(&seed);
        let page_limit = self.config.max_pages.get();
        // Turn the relative budget ("30 seconds") into a fixed point in time
        let deadline = self.config.deadline.map(|budget| Instant::now() + budget);

        info!(
            seed = %seed,
            page_limit,
            timeout_secs = self.fetcher.timeout().as_secs_f64(),
            "starting crawl"
        );

        // Fresh state per run: nothing leaks between crawls
        let mut state = CrawlState::new(seed, page_limit);
        let mut records = Vec::new();
        let mut pages_failed = 0;
        let mut cancelled = false;

        // has_work() is false once the frontier is empty or the limit is hit
        while state.has_work() {
            // Check before dequeuing, so a cancelled crawl fetches nothing more
            if cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
                cancelled = true;
                break;
            }

            // next() skips URLs that were visited after being queued
            let Some(current) = state.next() else {
                break;
            };

            info!(
                url = %current,
                visited = state.visited_count(),
                queued = state.queued_count(),
                "fetching page"
            );

            // `biased` polls the branches top to bottom, so a cancellation
            // that is already pending wins over a fetch that is also ready
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                _ = wait_until(deadline) => None,
                result = self.fetcher.fetch(current.as_str()) => Some(result),
            };

            let Some(fetched) = fetched else {
                warn!(url = %current, "crawl stopped while fetching");
                state.mark_visited(current);
                cancelled = true;
                break;
            };

            let page = match fetched {
                Ok(page) => page,
                // Timeouts, 404s, refused connections: log, count, move on
                Err(e) => {
                    warn!(url = %current, error = %e, "fetch failed");
                    pages_failed += 1;
                    state.mark_visited(current);
                    continue;
                }
            };

            // Images, PDFs and the like are visited but never parsed
            let extracted = if is_markup(page.content_type.as_deref()) {
                extract(&current, &page.body, &scope, state.visited())
            } else {
                debug!(
                    url = %current,
                    content_type = page.content_type.as_deref().unwrap_or_default(),
                    "skipping non-markup page"
                );
                Extracted::default()
            };

            debug!(
                url = %current,
                records = extracted.records.len(),
                links = extracted.links.len(),
                "page extracted"
            );

            records.extend(extracted.records);
            state.mark_visited(current);

            // offer() drops duplicates and anything over the page budget
            for link in extracted.links {
                state.offer(link);
            }
        }

        // Cancellation wins; otherwise "did we run out of budget or of links?"
        let stop_reason = if cancelled {
            StopReason::Cancelled
        } else if state.budget_spent() {
            StopReason::Exhausted
        } else {
            StopReason::Completed
        };

        info!(
            pages_visited = state.visited_count(),
            pages_failed,
            records = records.len(),
            stop_reason = ?stop_reason,
            "crawl finished"
        );

        Ok(CrawlResult {
            records,
            pages_visited: state.visited_count(),
            pages_failed,
            stop_reason,
        })
    }
}

/// One-shot crawl with default settings and the given page limit.
pub async fn run_crawl(seed: &str, page_limit: NonZeroUsize) -> Result<CrawlResult, CrawlError> {
    let crawler = Crawler::new(CrawlConfig::default().with_max_pages(page_limit))?;
    Ok(crawler.run(seed).await?)
}

// Resolves at `deadline`, or never when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending::<()>().await,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is a failed fetch still "visited"?
//    - Otherwise a broken link could be queued and retried forever
//    - It also makes the page limit a limit on requests, not on successes
//
// 2. What happens to the losing branches of tokio::select!?
//    - They are dropped. Dropping a reqwest future aborts the request,
//      which is how a cancelled crawl stops mid-fetch
//
// 3. Why futures::future::pending() in wait_until?
//    - With no deadline, that select! branch must simply never fire
//    - pending() is a future that never completes
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Mock, MockServer};
    use std::sync::Once;
    use std::time::Duration;

    static INIT: Once = Once::new();
    fn init_tracing() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt::try_init();
        });
    }

    fn crawler(max_pages: usize) -> Crawler {
        let config = CrawlConfig::default()
            .with_max_pages(NonZeroUsize::new(max_pages).unwrap());
        Crawler::new(config).unwrap()
    }

    async fn html_page<'a>(server: &'a MockServer, path: &str, body: String) -> Mock<'a> {
        let path = path.to_string();
        server
            .mock_async(move |when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body(body);
            })
            .await
    }

    fn paragraph(len: usize) -> String {
        format!("<p>{}</p>", "w".repeat(len))
    }

    #[tokio::test]
    async fn test_two_page_scenario() {
        init_tracing();
        let server = MockServer::start_async().await;
        let page_a = format!(
            "<html><body>{}{}{}<a href=\"/b\">b</a><a href=\"/a\">self</a></body></html>",
            paragraph(10),
            paragraph(50),
            paragraph(60)
        );
        let a = html_page(&server, "/a", page_a).await;
        let b = html_page(&server, "/b", "<p>short</p>".to_string()).await;

        let result = crawler(10).run(&server.url("/a")).await.unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].text.len(), 50);
        assert_eq!(result.records[1].text.len(), 60);
        assert!(result
            .records
            .iter()
            .all(|r| r.source_url == server.url("/a")));
        assert_eq!(result.pages_visited, 2);
        assert_eq!(result.stop_reason, StopReason::Completed);
        assert_eq!(a.hits_async().await, 1);
        assert_eq!(b.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_page_limit_one_fetches_only_the_seed() {
        init_tracing();
        let server = MockServer::start_async().await;
        let links: String = (0..5)
            .map(|i| format!("<a href=\"/p{}\">p{}</a>", i, i))
            .collect();
        let seed = html_page(&server, "/", format!("{}{}", paragraph(45), links)).await;
        let mut others = Vec::new();
        for i in 0..5 {
            others.push(html_page(&server, &format!("/p{}", i), paragraph(50)).await);
        }

        let result = crawler(1).run(&server.url("/")).await.unwrap();

        assert_eq!(result.pages_visited, 1);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.stop_reason, StopReason::Exhausted);
        assert_eq!(seed.hits_async().await, 1);
        for other in &others {
            assert_eq!(other.hits_async().await, 0);
        }
    }

    #[tokio::test]
    async fn test_seed_timeout_yields_empty_result() {
        init_tracing();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .delay(Duration::from_millis(1500))
                    .body(paragraph(80));
            })
            .await;

        let config = CrawlConfig {
            fetch_timeout: Duration::from_millis(200),
            ..CrawlConfig::default()
        };
        let result = Crawler::new(config)
            .unwrap()
            .run(&server.url("/slow"))
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.pages_visited, 1);
        assert_eq!(result.pages_failed, 1);
    }

    #[tokio::test]
    async fn test_fully_connected_graph_is_bounded() {
        init_tracing();
        let server = MockServer::start_async().await;
        let links: String = (0..8)
            .map(|i| format!("<a href=\"/p{}\">p{}</a>", i, i))
            .collect();
        let mut mocks = Vec::new();
        for i in 0..8 {
            let body = format!("{}{}", paragraph(41 + i), links);
            mocks.push(html_page(&server, &format!("/p{}", i), body).await);
        }

        let result = crawler(4).run(&server.url("/p0")).await.unwrap();

        let mut total_hits = 0;
        for mock in &mocks {
            let hits = mock.hits_async().await;
            assert!(hits <= 1, "a page was fetched twice");
            total_hits += hits;
        }
        assert_eq!(total_hits, 4);
        assert_eq!(result.pages_visited, 4);
        assert_eq!(result.records.len(), 4);
        assert_eq!(result.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        init_tracing();
        let server = MockServer::start_async().await;
        let text = |name: &str| format!("<p>{} {}</p>", name, "z".repeat(45));
        html_page(
            &server,
            "/",
            format!("{}<a href=\"/a\">a</a><a href=\"/b\">b</a>", text("root")),
        )
        .await;
        html_page(
            &server,
            "/a",
            format!("{}<a href=\"/a/deep\">deep</a>", text("a")),
        )
        .await;
        html_page(&server, "/b", text("b")).await;
        html_page(&server, "/a/deep", text("deep")).await;

        let result = crawler(10).run(&server.url("/")).await.unwrap();

        let order: Vec<&str> = result
            .records
            .iter()
            .map(|r| r.text.split(' ').next().unwrap())
            .collect();
        assert_eq!(order, vec!["root", "a", "b", "deep"]);
    }

    #[tokio::test]
    async fn test_other_hosts_are_never_fetched() {
        init_tracing();
        let home = MockServer::start_async().await;
        let away = MockServer::start_async().await;
        let external = away
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body(paragraph(90));
            })
            .await;
        html_page(
            &home,
            "/",
            format!(
                "{}<a href=\"{}\">away</a><a href=\"/local\">local</a>",
                paragraph(42),
                away.url("/page")
            ),
        )
        .await;
        html_page(&home, "/local", paragraph(43)).await;

        let result = crawler(10).run(&home.url("/")).await.unwrap();

        assert_eq!(external.hits_async().await, 0);
        assert_eq!(result.pages_visited, 2);
        let away_prefix = away.url("");
        assert!(result
            .records
            .iter()
            .all(|r| !r.source_url.starts_with(&away_prefix)));
    }

    #[tokio::test]
    async fn test_failed_page_is_counted_and_crawl_continues() {
        init_tracing();
        let server = MockServer::start_async().await;
        html_page(
            &server,
            "/",
            "<a href=\"/gone\">gone</a><a href=\"/ok\">ok</a>".to_string(),
        )
        .await;
        let gone = server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(500);
            })
            .await;
        html_page(&server, "/ok", paragraph(70)).await;

        let result = crawler(10).run(&server.url("/")).await.unwrap();

        assert_eq!(gone.hits_async().await, 1);
        assert_eq!(result.pages_visited, 3);
        assert_eq!(result.pages_failed, 1);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].source_url, server.url("/ok"));
    }

    #[tokio::test]
    async fn test_redirected_page_resolves_links_against_requested_url() {
        init_tracing();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/start");
                then.status(302).header("location", "/docs/");
            })
            .await;
        html_page(
            &server,
            "/docs/",
            format!("{}<a href=\"intro\">intro</a>", paragraph(52)),
        )
        .await;
        let top_level = html_page(&server, "/intro", paragraph(20)).await;
        let nested = html_page(&server, "/docs/intro", paragraph(20)).await;

        let result = crawler(10).run(&server.url("/start")).await.unwrap();

        // Records are credited to the address that was asked for
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].source_url, server.url("/start"));
        // "intro" is joined onto /start, not onto /docs/
        assert_eq!(top_level.hits_async().await, 1);
        assert_eq!(nested.hits_async().await, 0);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_query_and_slash_variants_fetched_once() {
        init_tracing();
        let server = MockServer::start_async().await;
        let docs = html_page(&server, "/docs", paragraph(50)).await;
        html_page(
            &server,
            "/",
            "<a href=\"/docs\">1</a><a href=\"/docs/\">2</a>\
             <a href=\"/docs?page=2\">3</a><a href=\"/docs#top\">4</a>"
                .to_string(),
        )
        .await;

        let result = crawler(10).run(&server.url("/")).await.unwrap();

        assert_eq!(docs.hits_async().await, 1);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_non_markup_pages_are_not_parsed() {
        init_tracing();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/file");
                then.status(200)
                    .header("content-type", "application/pdf")
                    .body(format!("{}<a href=\"/hidden\">x</a>", paragraph(60)));
            })
            .await;
        let hidden = html_page(&server, "/hidden", paragraph(60)).await;

        let result = crawler(10).run(&server.url("/file")).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.pages_visited, 1);
        assert_eq!(hidden.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_an_error() {
        let err = crawler(10).run("not a url").await.unwrap_err();
        assert_eq!(err.input, "not a url");
    }

    #[tokio::test]
    async fn test_cancelled_before_start_fetches_nothing() {
        let server = MockServer::start_async().await;
        let seed = html_page(&server, "/", paragraph(50)).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = crawler(10)
            .run_with_cancel(&server.url("/"), cancel)
            .await
            .unwrap();

        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.pages_visited, 0);
        assert_eq!(seed.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_deadline_returns_partial_result() {
        init_tracing();
        let server = MockServer::start_async().await;
        html_page(
            &server,
            "/",
            format!("{}<a href=\"/slow\">slow</a>", paragraph(55)),
        )
        .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .body(paragraph(55));
            })
            .await;

        let config = CrawlConfig {
            deadline: Some(Duration::from_millis(500)),
            ..CrawlConfig::default()
        };
        let started = std::time::Instant::now();
        let result = Crawler::new(config)
            .unwrap()
            .run(&server.url("/"))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_concurrent_crawls_do_not_share_state() {
        init_tracing();
        let server = MockServer::start_async().await;
        let seed = html_page(&server, "/", paragraph(48)).await;

        let shared = crawler(10);
        let url = server.url("/");
        let (first, second) = tokio::join!(shared.run(&url), shared.run(&url));

        assert_eq!(first.unwrap().records.len(), 1);
        assert_eq!(second.unwrap().records.len(), 1);
        assert_eq!(seed.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_run_crawl_entry_point() {
        let server = MockServer::start_async().await;
        html_page(&server, "/", paragraph(44)).await;

        let result = run_crawl(&server.url("/"), NonZeroUsize::new(3).unwrap())
            .await
            .unwrap();
        assert_eq!(result.records.len(), 1);

        let err = run_crawl("http://", NonZeroUsize::new(3).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidSeed(_)));
    }
}
