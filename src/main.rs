// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (to stderr, so stdout stays clean for JSON)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = text found, 1 = nothing found, 2 = error)
// =============================================================================

use anyhow::Result;
use clap::Parser;
use site_harvest::cli::{crawl_from_input, exit_code, Cli, Commands, CrawlArgs};
use site_harvest::{report, web, Crawler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "site_harvest=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = at least one record harvested (or the server shut down cleanly)
//   Ok(1) = crawl ran but found no qualifying text
//   Ok(2) = the input was rejected
//   Err   = unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl { url, json, settings } => handle_crawl(&url, json, &settings).await,
        Commands::Serve { bind, settings } => {
            web::serve(settings.to_server_config(bind)).await?;
            Ok(0)
        }
    }
}

// Handles the 'crawl' subcommand: print what happened, return the exit code
async fn handle_crawl(input: &str, json: bool, settings: &CrawlArgs) -> Result<i32> {
    let crawler = Crawler::new(settings.to_config())?;

    // Ctrl-C stops the crawl but still prints what was collected
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if !json {
        println!("🔍 Crawling: {}", input.trim());
        println!("📊 Page limit: {}", crawler.config().max_pages);
    }

    let outcome = crawl_from_input(&crawler, input, cancel).await;

    match &outcome {
        // Empty or host-less input never reached the crawler
        Err(e) => eprintln!("{}", e),
        Ok(harvest) if harvest.result.is_empty() => eprintln!(
            "{}",
            report::empty_result_message(&harvest.seed, harvest.result.pages_visited)
        ),
        Ok(harvest) if json => println!("{}", report::records_to_json(&harvest.result.records)?),
        Ok(harvest) => report::print_table(&harvest.result),
    }

    Ok(exit_code(&outcome))
}
