//! Social reaction lookup for stories.
//!
//! The [`ReactionAnalyzer`] takes the enriched story list and hands back the
//! same list, in the same order, with a `reactions` map attached to every story
//! that some forum discussed.
//!
//! # Hacker News
//!
//! [`HackerNewsReactions`] uses the public Algolia HN API:
//!
//! 1. `search?query=<url>&restrictSearchableAttributes=url&tags=story` finds
//!    submissions of the story URL; the highest-scoring exact URL match wins
//! 2. `items/<id>` returns the comment tree; the first few top-level comments
//!    become the notable quotes
//!
//! A lookup failure for one story only leaves that story without reactions.

use crate::errors::FetchError;
use crate::models::{ReactionRecord, Reactions, Story};
use crate::utils::{get_json, normalize_whitespace};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use scraper::{Html, Node};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Key of Hacker News entries in [`Story::reactions`].
pub const HACKER_NEWS: &str = "hacker_news";
/// Public Algolia endpoint for Hacker News.
pub const ALGOLIA_API: &str = "https://hn.algolia.com/api/v1";
/// Top-level comments kept as quotes.
pub const MAX_QUOTES: usize = 3;
const PARALLEL_LOOKUPS: usize = 4;

/// The reaction-analysis collaborator.
pub trait ReactionAnalyzer {
    /// Return `stories` in the same order, with reactions attached where found.
    async fn analyze(&self, stories: Vec<Story>) -> Vec<Story>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchHit {
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    points: Option<i64>,
    #[serde(default)]
    num_comments: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    children: Vec<CommentItem>,
}

#[derive(Debug, Deserialize)]
struct CommentItem {
    #[serde(default)]
    text: Option<String>,
}

/// Looks stories up on Hacker News.
#[derive(Debug, Clone)]
pub struct HackerNewsReactions {
    client: reqwest::Client,
    api_base: String,
}

impl HackerNewsReactions {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: ALGOLIA_API.to_string(),
        }
    }

    #[instrument(level = "info", skip(self))]
    async fn lookup(&self, url: &str) -> Result<Option<ReactionRecord>, FetchError> {
        let search_url = format!(
            "{}/search?query={}&restrictSearchableAttributes=url&tags=story",
            self.api_base,
            urlencoding::encode(url)
        );
        let search: SearchResponse = get_json(&self.client, &search_url).await?;
        let Some(hit) = best_hit(&search.hits, url) else {
            debug!(hits = search.hits.len(), "No matching Hacker News submission");
            return Ok(None);
        };

        let quotes = if hit.num_comments.unwrap_or(0) > 0 {
            let item_url = format!("{}/items/{}", self.api_base, hit.object_id);
            match get_json::<ItemResponse>(&self.client, &item_url).await {
                Ok(item) => quotes_from_comments(&item.children, MAX_QUOTES),
                Err(e) => {
                    warn!(error = %e, "Comment fetch failed; keeping counts only");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Some(ReactionRecord {
            score: hit.points.unwrap_or(0),
            comment_count: hit.num_comments.unwrap_or(0),
            quotes,
        }))
    }
}

impl ReactionAnalyzer for HackerNewsReactions {
    #[instrument(level = "info", skip_all, fields(count = stories.len()))]
    async fn analyze(&self, stories: Vec<Story>) -> Vec<Story> {
        let analyzed: Vec<Story> = stream::iter(stories)
            .map(|mut story| async move {
                match self.lookup(&story.url).await {
                    Ok(Some(record)) => {
                        story
                            .reactions
                            .get_or_insert_with(Reactions::new)
                            .insert(HACKER_NEWS.to_string(), record);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, url = %story.url, "Reaction lookup failed"),
                }
                story
            })
            .buffered(PARALLEL_LOOKUPS)
            .collect()
            .await;

        let discussed = analyzed.iter().filter(|s| s.reactions.is_some()).count();
        info!(total = analyzed.len(), discussed, "Analyzed social reactions");
        analyzed
    }
}

/// Comparable form of a URL: host without `www.`, path without a trailing
/// slash, and the query. Scheme and fragment are ignored.
fn match_key(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").to_lowercase();
    let path = url.path().trim_end_matches('/');
    Some(match url.query() {
        Some(q) => format!("{host}{path}?{q}"),
        None => format!("{host}{path}"),
    })
}

/// Highest-scoring hit whose URL is the same page as `story_url`.
fn best_hit<'a>(hits: &'a [SearchHit], story_url: &str) -> Option<&'a SearchHit> {
    let wanted = match_key(story_url)?;
    hits.iter()
        .filter(|h| h.url.as_deref().and_then(match_key).as_deref() == Some(wanted.as_str()))
        .max_by_key(|h| h.points.unwrap_or(0))
}

/// Elements that start a new line of text in comment bodies.
const BLOCK_TAGS: &[&str] = &["p", "div", "br", "li", "pre", "blockquote"];

/// Plain text of a comment's HTML body.
///
/// Inline markup is joined without gaps (`foo<i>bar</i>` is `foobar`); block
/// elements are separated by a space.
fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => text.push(' '),
            _ => {}
        }
    }
    normalize_whitespace(&text)
}

fn quotes_from_comments(comments: &[CommentItem], max: usize) -> Vec<String> {
    comments
        .iter()
        .filter_map(|c| c.text.as_deref())
        .map(strip_html)
        .filter(|q| !q.is_empty())
        .unique()
        .take(max)
        .collect()
}
