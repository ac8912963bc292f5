//! Command-line interface definitions for technews.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Apart from the story count, every option can also be set through an
//! environment variable.

use crate::cache::{DEFAULT_MAX_AGE_HOURS, default_cache_path};
use crate::pipeline::{DEFAULT_STORY_COUNT, PipelineConfig};
use crate::scrapers::techmeme::TECHMEME_URL;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for technews.
///
/// # Examples
///
/// ```sh
/// # Full briefing with the ten top stories
/// technews
///
/// # Five stories, printed as JSON without enrichment
/// technews 5 --fetch-only
///
/// # Ignore the cache for this run
/// technews 3 --no-cache
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of stories to include
    #[arg(default_value_t = DEFAULT_STORY_COUNT)]
    pub count: usize,

    /// Print the fetched stories as JSON and skip enrichment
    #[arg(long)]
    pub fetch_only: bool,

    /// Do not read the cache (a successful live fetch still refreshes it)
    #[arg(long)]
    pub no_cache: bool,

    /// Location of the story cache file [default: ~/.cache/technews/stories.json]
    #[arg(long, env = "TECHNEWS_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    /// Cached stories at least this many hours old are refetched
    #[arg(
        long,
        env = "TECHNEWS_MAX_AGE_HOURS",
        default_value_t = DEFAULT_MAX_AGE_HOURS,
        value_parser = parse_max_age_hours
    )]
    pub max_age_hours: f64,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "TECHNEWS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Aggregator homepage to scrape
    #[arg(long, env = "TECHNEWS_HOMEPAGE", default_value = TECHMEME_URL)]
    pub homepage: String,
}

/// Accept only finite, strictly positive hour counts.
fn parse_max_age_hours(raw: &str) -> Result<f64, String> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("`{raw}` is not a number: {e}"))?;
    if hours.is_finite() && hours > 0.0 {
        Ok(hours)
    } else {
        Err(format!("`{raw}` must be a positive number of hours"))
    }
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            count: self.count,
            use_cache: !self.no_cache,
            max_age_hours: self.max_age_hours,
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_file.clone().unwrap_or_else(default_cache_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
