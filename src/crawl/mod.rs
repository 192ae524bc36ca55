// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from a seed URL
// - Same-host restriction (external links are never followed)
// - A hard page budget: at most `max_pages` fetch attempts per crawl
// - Optional deadline / cancellation that keeps the partial result
//
// Submodules:
// - frontier: the per-crawl queue and visited set
// - queue: the crawl loop itself
// =============================================================================

mod frontier;
mod queue;

pub use queue::{run_crawl, CrawlResult, Crawler, StopReason};
