// src/error.rs
// =============================================================================
// Typed errors for the crawler.
//
// Only two of these ever reach a caller of the crawl engine:
// - InvalidUrl, when the seed itself cannot be normalized
// - CrawlError::Client, when the HTTP client cannot be built
//
// FetchError is produced once per failed page and absorbed by the engine:
// it is logged, the page counts as visited, and the crawl moves on.
//
// SeedError is the check done at the boundary (CLI / form) before a crawl
// is even started, and its messages are the ones shown to users.
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// A URL that does not resolve to an absolute address with a scheme and a host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid URL '{input}': {reason}")]
pub struct InvalidUrl {
    pub input: String,
    pub reason: String,
}

impl InvalidUrl {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Why a single page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not finish within the fetch timeout
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The server answered with a non-2xx status
    #[error("request to {url} failed with HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// Connection, DNS, TLS or protocol failure
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response headers arrived but the body could not be read
    #[error("could not read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Maps a reqwest error into the matching variant.
    pub fn from_request(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// Errors that abort a crawl before it starts.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    InvalidSeed(#[from] InvalidUrl),

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Rejections of user input, checked before the crawler is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error("Please enter a web address.")]
    Empty,

    #[error("Please enter a valid web address (e.g. https://example.com).")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message_names_input() {
        let err = InvalidUrl::new("http://", "missing host");
        assert_eq!(err.to_string(), "invalid URL 'http://': missing host");
    }

    #[test]
    fn test_seed_error_messages_are_user_facing() {
        assert_eq!(SeedError::Empty.to_string(), "Please enter a web address.");
        assert!(SeedError::Invalid("x".into())
            .to_string()
            .starts_with("Please enter a valid web address"));
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "http://example.test/a".into(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(
            err.to_string(),
            "request to http://example.test/a failed with HTTP 404 Not Found"
        );
    }
}
