//! # technews
//!
//! Builds a short briefing of the top tech stories on the Techmeme homepage.
//! Stories are optionally enriched with full article text and Hacker News
//! reactions, then rendered as a numbered text digest.
//!
//! ## Usage
//!
//! ```sh
//! technews            # full briefing, 10 stories
//! technews 5          # full briefing, 5 stories
//! technews 5 --fetch-only   # {"cached": ..., "stories": [...]} as JSON
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Obtaining**: Read fresh stories from the on-disk cache, or scrape the homepage
//! 2. **Fetching**: Download article content for each story URL (6 at a time)
//! 3. **Merging**: Overlay article text and summaries onto the stories by position
//! 4. **Reactions**: Look each story up on Hacker News
//! 5. **Output**: Render the digest to stdout
//!
//! Logs go to stderr; stdout carries only the digest or the JSON envelope.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod articles;
mod cache;
mod cli;
mod errors;
mod models;
mod outputs;
mod pipeline;
mod reactions;
mod scrapers;
mod utils;

use articles::HttpArticleFetcher;
use cache::FileCache;
use cli::Cli;
use outputs::json::envelope_to_json;
use pipeline::Orchestrator;
use reactions::HackerNewsReactions;
use scrapers::techmeme::TechmemeHomepage;
use utils::build_client;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let client = match build_client(args.timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let cache = FileCache::new(args.cache_path());
    info!(path = %cache.path().display(), "Using story cache");

    let orchestrator = Orchestrator::new(
        TechmemeHomepage::new(client.clone(), args.homepage.clone()),
        cache,
        HttpArticleFetcher::new(client.clone()),
        HackerNewsReactions::new(client),
        args.pipeline_config(),
    );

    let outcome = if args.fetch_only {
        match orchestrator.fetch_only().await {
            Ok(envelope) => match envelope_to_json(&envelope) {
                Ok(json) => Ok(json),
                Err(e) => {
                    error!(error = %e, "Failed to serialize stories");
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => Err(e),
        }
    } else {
        orchestrator.run().await.map(|digest| digest.text)
    };

    let elapsed = start_time.elapsed();
    match outcome {
        Ok(output) => {
            println!("{output}");
            info!(secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            println!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
