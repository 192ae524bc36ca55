// src/page/url.rs
// =============================================================================
// URL normalization and crawl scoping.
//
// Every URL the crawler touches goes through `normalize()` first. The result
// is the identity used by the visited set and the frontier, so two addresses
// that only differ by query string, fragment or trailing slash are the same
// page as far as the crawl is concerned:
//
//   https://example.com/docs/?page=2#intro  ->  https://example.com/docs
//
// Scoping is deliberately strict: a link is internal only if its authority
// (host and explicit port) is byte-for-byte the seed's authority.
// `www.example.com` and `example.com` are two different sites here.
//
// Rust concepts:
// - Manual trait impls: PartialEq/Eq/Hash look only at the key string, so
//   a NormalizedUrl can go straight into a HashSet
// - Newtypes: NormalizedUrl and Scope wrap plain strings so they can't be
//   mixed up with raw, unnormalized input
// - Result<T, E> with map_err: parser errors are turned into our own
//   InvalidUrl type at the edge of this module
// =============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};

use url::Url;

use crate::error::{InvalidUrl, SeedError};

/// A canonical crawl key: scheme + authority + path, no query, no fragment,
/// no trailing slash.
#[derive(Debug, Clone)]
pub struct NormalizedUrl {
    // The canonical string; this is what equality and hashing use
    key: String,
    // The same address parsed, kept so callers don't have to re-parse
    url: Url,
}

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Parsed form, used as the base when resolving relative links.
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// `host` or `host:port` when the port is not the scheme default.
    pub fn authority(&self) -> String {
        authority_of(&self.url)
    }
}

// Equality and hashing must agree, so both go through `key` only
impl PartialEq for NormalizedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NormalizedUrl {}

impl Hash for NormalizedUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// The authority every crawled page must share with the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    authority: String,
}

impl Scope {
    pub fn from_seed(seed: &NormalizedUrl) -> Self {
        Self {
            authority: seed.authority(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

// Resolves `raw` (possibly relative) against `base` and canonicalizes it.
//
// Examples:
//   normalize("/b?x=1", Some(http://example.test/a))  -> http://example.test/b
//   normalize("http://example.test/", None)           -> http://example.test
//   normalize("mailto:someone@example.test", None)    -> Err (no host)
pub fn normalize(raw: &str, base: Option<&Url>) -> Result<NormalizedUrl, InvalidUrl> {
    let raw = raw.trim();

    // Url::join handles "../x", "/x", "//other.host/x" and absolute URLs
    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| InvalidUrl::new(raw, e.to_string()))?;

    // mailto:, javascript:, data: and friends parse fine but have no host
    if !is_fetchable(&url) {
        return Err(InvalidUrl::new(raw, "missing scheme or host"));
    }

    url.set_query(None);
    url.set_fragment(None);

    // All trailing slashes go, so normalizing a key again is a no-op
    let key = url.as_str().trim_end_matches('/').to_string();

    // Parse the key back so `url` and `key` describe the same address
    let url = Url::parse(&key).map_err(|e| InvalidUrl::new(raw, e.to_string()))?;

    Ok(NormalizedUrl { key, url })
}

/// True iff the URL has both a scheme and a non-empty host.
pub fn is_fetchable(url: &Url) -> bool {
    !url.scheme().is_empty() && url.host_str().is_some_and(|host| !host.is_empty())
}

/// True iff `url` lives on exactly the seed's host (and port).
pub fn is_in_scope(url: &NormalizedUrl, scope: &Scope) -> bool {
    url.authority() == scope.authority
}

// Turns what a user typed into a seed address the crawler accepts.
//
// - surrounding whitespace is dropped
// - "example.com" becomes "http://example.com"
// - anything still lacking a host is rejected
//
// The returned string is what gets passed to the crawl engine, and also what
// user-facing messages quote back.
pub fn seed_from_input(input: &str) -> Result<String, SeedError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SeedError::Empty);
    }

    // Scheme check is case-insensitive ("HTTPS://..." is fine)
    let lowered = input.to_ascii_lowercase();
    let seed = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };

    // "http://" alone, or "http:// /x", still has no host after the fix-up
    match Url::parse(&seed) {
        Ok(url) if is_fetchable(&url) => Ok(seed),
        _ => Err(SeedError::Invalid(seed)),
    }
}

// `port()` is None for the scheme's default port, so
// http://a.test:80 and http://a.test share an authority.
fn authority_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why implement Hash by hand instead of #[derive(Hash)]?
//    - Deriving would hash the parsed Url too
//    - We want "same key" to mean "same page", nothing more
//
// 2. What does `is_some_and` do?
//    - Option::is_some_and(f) is true only for Some(x) where f(x) holds
//    - Shorter than `match host { Some(h) => !h.is_empty(), None => false }`
//
// 3. Why does normalize() take Option<&Url> for the base?
//    - The seed has no page to be relative to (None)
//    - Links found on a page are resolved against that page (Some)
// -----------------------------------------------------------------------------
