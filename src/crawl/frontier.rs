// src/crawl/frontier.rs
// =============================================================================
// Per-crawl bookkeeping: the queue of pages still to fetch and the set of
// pages already attempted.
//
// A fresh CrawlState is built for every crawl and dropped when it ends.
// Nothing here is global, so two crawls running at the same time (two
// requests to the form server, say) never see each other's URLs.
//
// Rust concepts:
// - VecDeque: FIFO queue, push_back() / pop_front()
// - HashSet: O(1) "have we seen this?" checks
// =============================================================================

use std::collections::{HashSet, VecDeque};

use crate::page::NormalizedUrl;

/// FIFO queue of pages awaiting fetch, with constant-time membership checks.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<NormalizedUrl>,
    queued: HashSet<NormalizedUrl>,
}

impl Frontier {
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.queued.contains(url)
    }

    /// Appends `url` unless it is already queued. Returns whether it was added.
    pub fn push(&mut self, url: NormalizedUrl) -> bool {
        if !self.queued.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    pub fn pop(&mut self) -> Option<NormalizedUrl> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }
}

/// Frontier plus visited set for one crawl.
#[derive(Debug)]
pub struct CrawlState {
    frontier: Frontier,
    visited: HashSet<NormalizedUrl>,
    page_limit: usize,
}

impl CrawlState {
    pub fn new(seed: NormalizedUrl, page_limit: usize) -> Self {
        let mut frontier = Frontier::default();
        frontier.push(seed);
        Self {
            frontier,
            visited: HashSet::new(),
            page_limit,
        }
    }

    /// True while there is work queued and budget left.
    pub fn has_work(&self) -> bool {
        !self.frontier.is_empty() && self.visited.len() < self.page_limit
    }

    /// Next queued URL that has not been attempted yet.
    pub fn next(&mut self) -> Option<NormalizedUrl> {
        while let Some(url) = self.frontier.pop() {
            if !self.visited.contains(&url) {
                return Some(url);
            }
        }
        None
    }

    pub fn mark_visited(&mut self, url: NormalizedUrl) {
        self.visited.insert(url);
    }

    pub fn visited(&self) -> &HashSet<NormalizedUrl> {
        &self.visited
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.frontier.len()
    }

    // Queues a discovered link if it fits in the budget.
    //
    // visited + queued never exceeds the page limit, which is what bounds the
    // number of fetches a crawl can make.
    pub fn offer(&mut self, url: NormalizedUrl) -> bool {
        if self.visited.len() + self.frontier.len() >= self.page_limit {
            return false;
        }
        if self.visited.contains(&url) || self.frontier.contains(&url) {
            return false;
        }
        self.frontier.push(url)
    }

    pub fn budget_spent(&self) -> bool {
        self.visited.len() >= self.page_limit
    }
}
