// src/config.rs
// =============================================================================
// Settings for a crawl and for the form server.
//
// Values come from command-line flags, which fall back to SITE_HARVEST_*
// environment variables (see cli.rs), which fall back to the defaults here.
// =============================================================================

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Pages fetched per crawl when nothing else is configured.
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A desktop Chrome User-Agent; plenty of sites answer bare clients with 403.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Upper bound on fetch attempts, failed ones included
    pub max_pages: NonZeroUsize,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    /// Wall-clock budget for a whole crawl; `None` means unbounded
    pub deadline: Option<Duration>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: NonZeroUsize::new(DEFAULT_MAX_PAGES).unwrap_or(NonZeroUsize::MIN),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            deadline: None,
        }
    }
}

impl CrawlConfig {
    pub fn with_max_pages(mut self, max_pages: NonZeroUsize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub crawl: CrawlConfig,
}
