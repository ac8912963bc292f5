//! Aggregator homepage scrapers.
//!
//! Scraping is split into two phases so the parsing half stays free of I/O:
//!
//! 1. **Retrieval**: a [`HomepageSource`] downloads the raw homepage HTML
//! 2. **Extraction**: a pure function turns that HTML into [`Story`](crate::models::Story) values
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Techmeme | [`techmeme`] | HTML scraping | `div.story` blocks on the homepage |

pub mod techmeme;

use crate::errors::FetchError;

/// Something that can hand back the raw HTML of an aggregator homepage.
///
/// The orchestrator only talks to this trait, so tests can serve fixture HTML
/// and count how many times the "network" was touched.
pub trait HomepageSource {
    /// Base URL that root-relative story links are resolved against.
    fn base_url(&self) -> &str;

    /// Download the homepage. Transport failures of any kind come back as a
    /// single [`FetchError`].
    async fn fetch_homepage(&self) -> Result<String, FetchError>;
}
