// src/report.rs
// =============================================================================
// Turns a crawl result into something a person (or a pipeline) can read.
//
// - JSON: an array of [source_url, text] pairs, pretty-printed, UTF-8, with
//   non-ASCII characters left as they are
// - Table: one line per record plus a summary, for terminals
// =============================================================================

use crate::crawl::CrawlResult;
use crate::page::ScrapedRecord;

/// Pretty JSON array of `[source_url, text]` pairs.
pub fn records_to_json(records: &[ScrapedRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Message shown when a crawl visited pages but found no qualifying text.
pub fn empty_result_message(seed: &str, pages_visited: usize) -> String {
    format!(
        "No text could be extracted from '{}'. (Pages visited: {})",
        seed, pages_visited
    )
}

// Prints records as a human-readable table in the terminal
pub fn print_table(result: &CrawlResult) {
    println!("{:<50} {:<70}", "SOURCE", "TEXT");
    println!("{}", "=".repeat(121));

    for record in &result.records {
        println!(
            "{:<50} {:<70}",
            truncate(&record.source_url, 50),
            truncate(&record.text, 70)
        );
    }

    println!();
    println!("📊 Summary:");
    println!("   📝 Records: {}", result.records.len());
    println!("   📄 Pages visited: {}", result.pages_visited);
    println!("   ❌ Failed fetches: {}", result.pages_failed);
}

// Shortens `text` to at most `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
