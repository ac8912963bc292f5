//! Article content fetching and extractive summaries.
//!
//! The orchestrator hands over every story URL at once and expects exactly one
//! [`ArticleResult`] back per URL, in the same order. Failures are reported per
//! URL and never abort the batch.
//!
//! # Content Extraction
//!
//! Paragraph text is taken from `<article> p` when the page has an `<article>`
//! element, otherwise from every `<p>` in the document. Pages that yield less
//! than [`MIN_CONTENT_CHARS`] characters (paywalls, script-rendered pages)
//! count as failures.

use crate::errors::FetchError;
use crate::models::ArticleResult;
use crate::utils::{get_text, normalize_whitespace, truncate_chars};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Pages with less text than this are treated as failed fetches.
pub const MIN_CONTENT_CHARS: usize = 200;
/// Target length of the extractive summary.
pub const SUMMARY_CHARS: usize = 300;
/// How many articles are downloaded at the same time.
pub const PARALLEL_FETCHES: usize = 6;

static ARTICLE_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("valid article selector"));
static ALL_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid paragraph selector"));
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["'”’)]*(\s+|$)"#).expect("valid sentence regex"));

/// The article-content collaborator.
pub trait ArticleFetcher {
    /// Fetch every URL. The result has the same length as `urls` and
    /// `result[i]` belongs to `urls[i]`.
    async fn fetch_all(&self, urls: &[String]) -> Vec<ArticleResult>;
}

/// Fetches articles over HTTP, several at a time.
#[derive(Debug, Clone)]
pub struct HttpArticleFetcher {
    client: reqwest::Client,
    parallel: usize,
}

impl HttpArticleFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            parallel: PARALLEL_FETCHES,
        }
    }

    /// Fetch and extract a single article.
    #[instrument(level = "info", skip(self))]
    async fn fetch_one(&self, url: &str) -> Result<ArticleResult, FetchError> {
        let html = get_text(&self.client, url).await?;
        let content = extract_content(&html);
        let chars = content.chars().count();
        if chars < MIN_CONTENT_CHARS {
            return Err(FetchError::new(
                url,
                format!("only {chars} characters of article text"),
            ));
        }
        let summary = summarize(&content, SUMMARY_CHARS);
        debug!(chars, "Parsed article");
        Ok(ArticleResult::ok(content, summary))
    }
}

impl ArticleFetcher for HttpArticleFetcher {
    #[instrument(level = "info", skip_all, fields(count = urls.len()))]
    async fn fetch_all(&self, urls: &[String]) -> Vec<ArticleResult> {
        let t0 = Instant::now();
        // `buffered` yields in input order, which the merge step relies on.
        let results: Vec<ArticleResult> = stream::iter(urls.iter())
            .map(|url| async move {
                match self.fetch_one(url).await {
                    Ok(article) => article,
                    Err(e) => {
                        warn!(error = %e, %url, "Article fetch failed");
                        ArticleResult::failed()
                    }
                }
            })
            .buffered(self.parallel.max(1))
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            total = results.len(),
            succeeded,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched article contents"
        );
        results
    }
}

/// Pull readable paragraph text out of an article page.
pub fn extract_content(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut paragraphs: Vec<String> = document
        .select(&ARTICLE_PARAGRAPHS)
        .map(|p| normalize_whitespace(&p.text().collect::<String>()))
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&ALL_PARAGRAPHS)
            .map(|p| normalize_whitespace(&p.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .collect();
    }
    paragraphs.join("\n\n")
}

/// Leading whole sentences of `content`, up to `max_chars` characters.
///
/// If the first sentence alone is longer than `max_chars` it is cut at the
/// character limit instead.
pub fn summarize(content: &str, max_chars: usize) -> String {
    let text = normalize_whitespace(content);
    let mut end = 0;
    for m in SENTENCE_END.find_iter(&text) {
        let candidate = text[..m.end()].trim_end();
        if candidate.chars().count() > max_chars {
            break;
        }
        end = candidate.len();
    }
    if end == 0 {
        truncate_chars(&text, max_chars).trim_end().to_string()
    } else {
        text[..end].to_string()
    }
}
