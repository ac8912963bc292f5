//! Techmeme homepage scraper.
//!
//! This module scrapes top stories from [Techmeme](https://www.techmeme.com).
//! Each story on the homepage lives in a `div.story` block:
//!
//! ```text
//! div.story
//! ├── a.ourh      headline text + article link (required)
//! ├── div.intr    short description (optional)
//! └── span.dt     timestamp label, e.g. "2h" (optional)
//! ```
//!
//! Blocks without a usable headline link are skipped one by one; a bad block
//! never stops extraction of the blocks after it.

use super::HomepageSource;
use crate::errors::FetchError;
use crate::models::Story;
use crate::utils::{get_text, normalize_whitespace, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

/// Homepage URL and base for resolving relative story links.
pub const TECHMEME_URL: &str = "https://www.techmeme.com";

static STORY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.story").expect("valid story selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.ourh").expect("valid link selector"));
static SUMMARY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.intr").expect("valid summary selector"));
static TIMESTAMP_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.dt").expect("valid timestamp selector"));

/// Why a story block was left out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no headline link")]
    MissingLink,
    #[error("headline text is empty")]
    EmptyTitle,
    #[error("headline link has no href")]
    EmptyHref,
    #[error("link {0:?} cannot be made absolute")]
    UnresolvableUrl(String),
}

/// Result of examining one story block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Story(Story),
    Skipped(SkipReason),
}

/// Extract up to `limit` stories from Techmeme homepage HTML, in document order.
///
/// Never fails: malformed blocks are skipped and an empty result is a valid
/// outcome the caller must handle.
///
/// # Arguments
///
/// * `html` - Raw homepage HTML
/// * `base_url` - Base for root-relative links, normally [`TECHMEME_URL`]
/// * `limit` - Maximum number of stories to return
pub fn extract(html: &str, base_url: &str, limit: usize) -> Vec<Story> {
    if limit == 0 {
        return Vec::new();
    }
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let stories: Vec<Story> = document
        .select(&STORY_SELECTOR)
        .enumerate()
        .map(|(index, block)| (index, parse_block(block, base.as_ref())))
        .filter_map(|(index, outcome)| match outcome {
            BlockOutcome::Story(story) => Some(story),
            BlockOutcome::Skipped(reason) => {
                debug!(index, %reason, "Skipping story block");
                None
            }
        })
        .take(limit)
        .collect();

    debug!(count = stories.len(), limit, "Extracted Techmeme stories");
    stories
}

/// Examine a single `div.story` block.
pub fn parse_block(block: ElementRef<'_>, base: Option<&Url>) -> BlockOutcome {
    let Some(link) = block.select(&LINK_SELECTOR).next() else {
        return BlockOutcome::Skipped(SkipReason::MissingLink);
    };

    let title = element_text(link);
    if title.is_empty() {
        return BlockOutcome::Skipped(SkipReason::EmptyTitle);
    }

    let href = link.value().attr("href").map(str::trim).unwrap_or_default();
    if href.is_empty() {
        return BlockOutcome::Skipped(SkipReason::EmptyHref);
    }
    let Some(url) = resolve_url(href, base) else {
        return BlockOutcome::Skipped(SkipReason::UnresolvableUrl(href.to_string()));
    };

    let summary = block
        .select(&SUMMARY_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let timestamp = block
        .select(&TIMESTAMP_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();

    BlockOutcome::Story(Story::new(title, url, summary, timestamp))
}

/// Turn an `href` into an absolute `http(s)` URL.
///
/// Absolute links are kept as-is; root-relative and relative links are joined
/// onto `base`. Returns `None` for anything that ends up without an
/// `http`/`https` scheme (e.g. `javascript:` or `mailto:` links).
pub fn resolve_url(href: &str, base: Option<&Url>) -> Option<String> {
    let parsed = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(href).ok()?,
        Err(_) => return None,
    };
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(parsed.to_string()),
        _ => None,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Live Techmeme homepage over HTTP.
#[derive(Debug, Clone)]
pub struct TechmemeHomepage {
    client: reqwest::Client,
    url: String,
}

impl TechmemeHomepage {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl HomepageSource for TechmemeHomepage {
    fn base_url(&self) -> &str {
        &self.url
    }

    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn fetch_homepage(&self) -> Result<String, FetchError> {
        let html = get_text(&self.client, &self.url).await?;
        info!(bytes = html.len(), "Fetched Techmeme homepage");
        debug!(preview = %truncate_for_log(&html, 200), "Homepage body");
        Ok(html)
    }
}
