//! Bounded, same-host web crawler that harvests readable text.
//!
//! Starting from a seed address the crawler walks a site breadth-first,
//! never leaving the seed's host, and collects every paragraph, heading and
//! list item whose visible text is longer than 40 characters as a
//! `[page, text]` pair.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::num::NonZeroUsize;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = site_harvest::run_crawl("https://example.com", NonZeroUsize::new(10).unwrap()).await?;
//!     println!("{}", site_harvest::report::records_to_json(&result.records)?);
//!     Ok(())
//! }
//! ```
//!
//! # Crawling Behavior
//!
//! - URLs are compared after normalization (no query, fragment or trailing slash)
//! - Only links on exactly the seed's host and port are followed
//! - At most `max_pages` fetches are attempted; failed fetches count
//! - A failed page is logged and skipped, never fatal
//! - Each crawl owns its frontier and visited set
pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod page;
pub mod report;
pub mod web;

pub use crawl::{run_crawl, CrawlResult, Crawler, StopReason};
