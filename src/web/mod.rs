// src/web/mod.rs
// =============================================================================
// The web front end.
//
// Routes:
// - GET  /           the form
// - POST /           form submission; renders the JSON result or an error
// - POST /api/crawl  the same crawl for scripts, as JSON in and JSON out
// - GET  /healthz    liveness check
//
// All handlers share one `Crawler`. It carries no per-crawl state, so
// simultaneous submissions each get their own frontier and visited set.
// =============================================================================

mod form;

pub use form::{router, serve, AppState};
