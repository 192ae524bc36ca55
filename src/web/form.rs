// src/web/form.rs
// =============================================================================
// HTML form and JSON API handlers.
//
// Input checks happen here, before the crawler is touched:
// - empty input            -> "Please enter a web address."
// - no scheme/host at all  -> "Please enter a valid web address ..."
// Everything else is crawled. A crawl that finds nothing is reported with
// the number of pages it visited, which tells "site has no text" apart from
// "site could not be reached at all".
//
// If the browser gives up on a request, axum drops the handler future and the
// crawl stops with it.
//
// Rust concepts:
// - Extractors: handler arguments like State(..), Form(..) and Json(..) are
//   pulled out of the request by axum before the handler runs
// - Result<Json<T>, E> return types: both arms implement IntoResponse, so
//   the error arm becomes an HTTP error response
// - Clone-able state: AppState is cloned into every request (cheap, the
//   reqwest client inside is reference counted)
// =============================================================================

use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::crawl::{CrawlResult, Crawler, StopReason};
use crate::error::SeedError;
use crate::page::{seed_from_input, ScrapedRecord};
use crate::report::{empty_result_message, records_to_json};

// Shared by every request. Only configuration lives here: the frontier and
// visited set are created inside each crawl.
#[derive(Clone)]
pub struct AppState {
    crawler: Crawler,
}

impl AppState {
    pub fn new(crawler: Crawler) -> Self {
        Self { crawler }
    }
}

// Builds the router. Split from `serve` so tests can call it directly
// without binding a port.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/api/crawl", post(crawl_api))
        .route("/healthz", get(healthz))
        .with_state(state)
}

// Starts the server and runs until the process is stopped
pub async fn serve(config: ServerConfig) -> Result<()> {
    // Building the HTTP client can fail (e.g. TLS backend), so do it once, up front
    let crawler = Crawler::new(config.crawl).context("failed to set up the crawler")?;
    let app = router(AppState::new(crawler));

    tracing::info!("site-harvest listening on http://{}", config.bind);

    // Bind first so a busy port is reported clearly, then hand over to axum
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

// Body of POST /, field name kept compatible with the HTML form
#[derive(Debug, Deserialize)]
pub struct CrawlForm {
    // A missing field is treated like an empty one
    #[serde(default)]
    url_address: String,
}

// Body of POST /api/crawl, e.g. {"url": "example.com", "max_pages": 5}
#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    url: String,
    /// Lowers (never raises) the server's page limit for this request
    max_pages: Option<NonZeroUsize>,
}

// Records serialize as [url, text] pairs, the same shape the CLI prints
#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    records: Vec<ScrapedRecord>,
    pages_visited: usize,
    pages_failed: usize,
    stop_reason: StopReason,
}

impl From<CrawlResult> for CrawlResponse {
    fn from(result: CrawlResult) -> Self {
        Self {
            records: result.records,
            pages_visited: result.pages_visited,
            pages_failed: result.pages_failed,
            stop_reason: result.stop_reason,
        }
    }
}

// Every API failure, whatever its cause, is answered as {"error": "..."}
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

// Liveness check: the process is up and the router answers
async fn healthz() -> StatusCode {
    StatusCode::OK
}

// GET / - an empty form, no results, no error
async fn show_form() -> Html<String> {
    Html(render_page("", None, None))
}

// POST / - validate, crawl, render
//
// The page always comes back with status 200: user mistakes and empty
// crawls are shown inline next to the form, like the results are.
async fn submit_form(State(state): State<AppState>, Form(form): Form<CrawlForm>) -> Html<String> {
    let input = form.url_address.trim().to_string();

    // Empty or host-less input: show the message, never start a crawl
    let seed = match seed_from_input(&input) {
        Ok(seed) => seed,
        Err(e) => return Html(render_page(&input, None, Some(&e.to_string()))),
    };

    tracing::info!(seed = %seed, "crawl requested from form");

    let page = match state.crawler.run(&seed).await {
        // seed_from_input already checked the shape, so this is rare
        Err(_) => render_page(&seed, None, Some(&SeedError::Invalid(seed.clone()).to_string())),

        // Pages were visited but none had qualifying text. Saying how many
        // were visited tells "no text" apart from "site unreachable" (1 page)
        Ok(result) if result.is_empty() => render_page(
            &seed,
            None,
            Some(&empty_result_message(&seed, result.pages_visited)),
        ),

        // The normal case: pretty JSON inside a <pre>
        Ok(result) => match records_to_json(&result.records) {
            Ok(json) => render_page(&seed, Some(&json), None),
            Err(e) => {
                tracing::error!(error = %e, "could not serialize records");
                render_page(&seed, None, Some("The results could not be displayed."))
            }
        },
    };

    Html(page)
}

// POST /api/crawl - the same crawl for scripts
//
// The body is taken as Result<Json<_>, JsonRejection> rather than Json<_>,
// so a malformed body, a missing "url" or a wrong Content-Type is answered
// in our {"error": ...} shape instead of axum's plain-text default.
async fn crawl_api(
    State(state): State<AppState>,
    payload: Result<Json<CrawlRequest>, JsonRejection>,
) -> Result<Json<CrawlResponse>, (StatusCode, Json<ErrorBody>)> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected crawl request body");
        error_response(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    let seed = seed_from_input(&request.url).map_err(bad_request)?;

    // A request may ask for fewer pages than the server allows, never more
    let crawler = match request.max_pages {
        Some(requested) if requested < state.crawler.config().max_pages => {
            state.crawler.with_max_pages(requested)
        }
        _ => state.crawler.clone(),
    };

    let result = crawler
        .run(&seed)
        .await
        .map_err(|_| bad_request(SeedError::Invalid(seed.clone())))?;

    Ok(Json(result.into()))
}

// 400 with the user-facing message of a rejected seed
fn bad_request(error: SeedError) -> (StatusCode, Json<ErrorBody>) {
    error_response(StatusCode::BAD_REQUEST, error.to_string())
}

fn error_response(status: StatusCode, error: String) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error }))
}

// Renders the whole page: the form, then either results or an error.
//
// Parameters:
//   url_input:    echoed back into the text box
//   json_results: pretty JSON of the records, if the crawl found any
//   error:        a user-facing message, if something went wrong
//
// Every piece of user or page content is escaped, since crawled text can
// contain anything, including markup.
fn render_page(url_input: &str, json_results: Option<&str>, error: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(error) = error {
        body.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            escape_html(error)
        ));
    }
    if let Some(json) = json_results {
        body.push_str(&format!(
            "<h2>Results</h2>\n<pre id=\"results\">{}</pre>\n",
            escape_html(json)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>site-harvest</title>
<style>
body {{ font-family: sans-serif; max-width: 60rem; margin: 2rem auto; }}
.error {{ color: #b00020; }}
pre {{ background: #f4f4f4; padding: 1rem; overflow-x: auto; white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>site-harvest</h1>
<form method="post" action="/">
<input type="text" name="url_address" value="{}" placeholder="https://example.com" size="50">
<button type="submit">Crawl</button>
</form>
{}</body>
</html>
"#,
        escape_html(url_input),
        body
    )
}

// Escapes the five characters that matter in HTML text and attribute values
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does the form handler return Html<String> and not a Result?
//    - Every outcome (results, bad input, nothing found) is a normal page
//    - Only the JSON API uses status codes to signal failure
//
// 2. What is a JsonRejection?
//    - The error axum produces when the Json extractor can't build the type:
//      bad syntax, missing fields, wrong Content-Type
//    - Asking for Result<Json<T>, JsonRejection> hands it to us instead of
//      letting axum answer on its own
//
// 3. Why build HTML with format! instead of a template engine?
//    - One small page, one place that renders it
//    - escape_html is applied to every inserted value
// -----------------------------------------------------------------------------
