// src/page/html.rs
// =============================================================================
// This module turns a fetched page into records and follow-up links.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which recovers from broken markup the way
//   browsers do, so parsing never fails
//
// Text policy:
//   <p>, <h1>..<h6> and <li> elements, in document order. The visible text
//   of each one (whitespace collapsed, trimmed) is kept when it is longer
//   than 40 characters. Short strings are mostly navigation, buttons and
//   captions.
//
// Link policy:
//   every <a href>, resolved against the page, normalized, and kept only if
//   it is on the seed's host and has not been visited yet.
// =============================================================================

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::page::url::{is_in_scope, normalize, NormalizedUrl, Scope};

/// Minimum length (exclusive) of a text block worth keeping.
pub const MIN_TEXT_CHARS: usize = 40;

static CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, li").expect("content selector is valid")
});

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector is valid"));

// Text inside these never shows up on screen
const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// One qualifying text block and the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRecord {
    pub source_url: String,
    pub text: String,
}

// Serialized as a two-element array: ["https://example.com/page", "text"]
impl Serialize for ScrapedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.source_url)?;
        pair.serialize_element(&self.text)?;
        pair.end()
    }
}

/// Everything one page contributes to the crawl.
#[derive(Debug, Default)]
pub struct Extracted {
    pub records: Vec<ScrapedRecord>,
    pub links: Vec<NormalizedUrl>,
}

// Parses `body` and collects records and candidate links.
//
// Parameters:
//   page_url: normalized address of the page (record source, link base)
//   body:     raw response bytes; invalid UTF-8 is replaced, not rejected
//   scope:    the seed's authority
//   visited:  pages this crawl already fetched; such links are not candidates
pub fn extract(
    page_url: &NormalizedUrl,
    body: &[u8],
    scope: &Scope,
    visited: &HashSet<NormalizedUrl>,
) -> Extracted {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    Extracted {
        records: extract_records(&document, page_url),
        links: extract_links(&document, page_url, scope, visited),
    }
}

/// Whether a Content-Type is worth parsing. A missing header counts as yes.
pub fn is_markup(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}

/// Replaces double quotes with single quotes and control whitespace with spaces.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '"' => '\'',
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn extract_records(document: &Html, page_url: &NormalizedUrl) -> Vec<ScrapedRecord> {
    document
        .select(&CONTENT_SELECTOR)
        .filter_map(|element| {
            let text = visible_text(element);
            if text.chars().count() > MIN_TEXT_CHARS {
                Some(ScrapedRecord {
                    source_url: page_url.to_string(),
                    text: sanitize_text(&text),
                })
            } else {
                None
            }
        })
        .collect()
}

fn extract_links(
    document: &Html,
    page_url: &NormalizedUrl,
    scope: &Scope,
    visited: &HashSet<NormalizedUrl>,
) -> Vec<NormalizedUrl> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        // Unresolvable or host-less hrefs (mailto:, javascript:, ...) are dropped
        let Ok(link) = normalize(href, Some(page_url.as_url())) else {
            continue;
        };

        if is_in_scope(&link, scope) && !visited.contains(&link) && seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

// Concatenates the text nodes under `element`, skipping hidden subtrees, then
// collapses every whitespace run into a single space.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_TAGS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}
