// src/page/mod.rs
// =============================================================================
// Everything that happens to a single page.
//
// Submodules:
// - url: normalizes addresses and decides what is in scope
// - fetch: downloads one page
// - html: pulls text records and follow-up links out of the markup
//
// None of these keep state between calls; the crawl engine owns all of it.
// =============================================================================

mod fetch;
mod html;
mod url;

pub use fetch::{FetchedPage, PageFetcher};
pub use html::{extract, is_markup, sanitize_text, Extracted, ScrapedRecord, MIN_TEXT_CHARS};
pub use url::{is_fetchable, is_in_scope, normalize, seed_from_input, NormalizedUrl, Scope};
