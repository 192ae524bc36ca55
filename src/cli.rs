// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: crawl one site right now and print what was harvested
// - serve: start the web form, so people can paste a URL into a browser
//
// Every crawl setting can also come from a SITE_HARVEST_* environment
// variable (clap's `env` feature), which is handy for the server.
// =============================================================================

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::{CrawlConfig, ServerConfig, DEFAULT_BIND, DEFAULT_USER_AGENT};
use crate::crawl::{CrawlResult, Crawler};
use crate::error::SeedError;
use crate::page::seed_from_input;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "site-harvest",
    version,
    about = "Crawl a website and harvest its readable text blocks",
    long_about = "site-harvest walks a website breadth-first, staying on the host you give it, \
                  and collects every paragraph, heading and list item longer than 40 characters \
                  as [page, text] pairs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and print the harvested text
    ///
    /// Example: site-harvest crawl example.com --max-pages 25 --json
    Crawl {
        /// Website to start from. "http://" is added when no scheme is given
        url: String,

        /// Output records as a JSON array of [url, text] pairs
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: CrawlArgs,
    },

    /// Serve the HTML form (and a small JSON API) over HTTP
    ///
    /// Example: site-harvest serve --bind 127.0.0.1:8080
    Serve {
        /// Address to listen on
        #[arg(long, env = "SITE_HARVEST_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        #[command(flatten)]
        settings: CrawlArgs,
    },
}

// Settings shared by both subcommands
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Maximum number of pages to fetch (failed fetches count too)
    #[arg(long, env = "SITE_HARVEST_MAX_PAGES", default_value = "10")]
    pub max_pages: NonZeroUsize,

    /// Per-request timeout in seconds
    #[arg(long, env = "SITE_HARVEST_TIMEOUT", default_value_t = 10)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "SITE_HARVEST_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Stop the whole crawl after this many seconds and keep what was found
    #[arg(long, env = "SITE_HARVEST_DEADLINE")]
    pub deadline: Option<u64>,
}

impl CrawlArgs {
    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_pages: self.max_pages,
            fetch_timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
            deadline: self.deadline.map(Duration::from_secs),
        }
    }

    pub fn to_server_config(&self, bind: SocketAddr) -> ServerConfig {
        ServerConfig {
            bind,
            crawl: self.to_config(),
        }
    }
}

// What a `crawl` run produced: the seed that was actually crawled (after the
// "http://" fix-up) and the crawl result.
#[derive(Debug)]
pub struct Harvest {
    pub seed: String,
    pub result: CrawlResult,
}

// Checks the user's input, then crawls it.
//
// Parameters:
//   crawler: a configured crawler (shared, holds no crawl state)
//   input:   the URL exactly as the user typed it
//   cancel:  fires on Ctrl-C; the partial result is still returned
//
// Returns: Err(SeedError) when the input is empty or has no host. In that
// case the crawler is never called, so nothing is fetched.
pub async fn crawl_from_input(
    crawler: &Crawler,
    input: &str,
    cancel: CancellationToken,
) -> Result<Harvest, SeedError> {
    // Reject bad input before any network traffic happens
    let seed = seed_from_input(input)?;

    // The engine normalizes the seed again; if that fails, report it in
    // terms of what the user typed rather than the parser's message
    let result = crawler
        .run_with_cancel(&seed, cancel)
        .await
        .map_err(|_| SeedError::Invalid(seed.clone()))?;

    Ok(Harvest { seed, result })
}

// Maps the outcome of a `crawl` run onto the process exit code
//
//   0 = at least one record was harvested
//   1 = the crawl ran but found no qualifying text
//   2 = the input was rejected
pub fn exit_code(outcome: &Result<Harvest, SeedError>) -> i32 {
    match outcome {
        Ok(harvest) if harvest.result.is_empty() => 1,
        Ok(_) => 0,
        Err(_) => 2,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is crawl_from_input in the library and not in main.rs?
//    - Code in a binary crate's main.rs can't be reached by unit tests
//      living in the library
//    - Keeping main.rs thin (parse, call, print) means every decision it
//      makes is tested here
//
// 2. What is #[command(flatten)]?
//    - It splices the fields of another Args struct into a subcommand
//    - Both `crawl` and `serve` get --max-pages, --timeout, ... for free
//
// 3. What does `env = "..."` on an argument do?
//    - If the flag is missing, clap reads the environment variable instead
//    - Order of precedence: flag, then environment, then default
// -----------------------------------------------------------------------------
