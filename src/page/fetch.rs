// src/page/fetch.rs
// =============================================================================
// This module downloads a single page.
//
// Key functionality:
// - One GET request per page, no retries
// - A fixed per-request timeout (10 seconds unless configured otherwise)
// - A browser-like User-Agent, because many sites refuse obvious bots
// - Anything but a 2xx answer is a failure
//
// A failure is not fatal for the crawl: the engine logs it, counts the page
// as visited and keeps going with the rest of the queue.
// =============================================================================

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::CrawlConfig;
use crate::error::FetchError;

/// Raw result of a successful GET.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Value of the Content-Type header, if the server sent one
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Thin wrapper around a reqwest client configured for crawling.
///
/// Cloning is cheap (the client is reference counted internally), so one
/// fetcher can be shared by every crawl the process runs.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            timeout: config.fetch_timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // Fetches `url` and returns its body bytes.
    //
    // Errors:
    //   Timeout - the whole exchange took longer than the configured timeout
    //   Status  - the server answered, but not with 2xx
    //   Request - DNS, connection, TLS, unsupported scheme, ...
    //   Body    - the body stream broke halfway
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(FetchedPage {
            content_type,
            body: body.to_vec(),
        })
    }
}
