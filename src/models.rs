//! Data models for stories, their enrichments, and the persisted cache entry.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Story`]: A story extracted from the aggregator homepage, optionally enriched
//! - [`ReactionRecord`]: Social reaction metrics for one story from one forum
//! - [`ArticleResult`]: The article-content fetcher's per-URL outcome
//! - [`CacheEntry`]: The single persisted "most recent fetch"
//! - [`FetchEnvelope`]: The JSON printed in fetch-only mode
//!
//! Field names are snake_case on the wire, matching the cache file format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier written into [`Story::source`] for stories taken from Techmeme.
pub const TECHMEME_SOURCE: &str = "techmeme";

/// Reactions keyed by forum name (e.g. `"hacker_news"`).
///
/// A `BTreeMap` keeps serialization order stable between runs.
pub type Reactions = BTreeMap<String, ReactionRecord>;

/// A single top story.
///
/// Created by the extractor (or read back verbatim from the cache). The
/// orchestrator may later fill in `summary`, `content` and `reactions`; no
/// other field changes after extraction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Story {
    /// Headline text, never empty.
    pub title: String,
    /// Absolute `http`/`https` URL of the linked article.
    pub url: String,
    /// Short description; empty when the homepage had none.
    #[serde(default)]
    pub summary: String,
    /// Opaque timestamp label as shown on the homepage; may be empty.
    #[serde(default)]
    pub timestamp: String,
    /// Which aggregator the story came from.
    pub source: String,
    /// Full article text, present only after a successful article fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Forum reactions, present only when at least one forum discussed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Reactions>,
}

impl Story {
    /// Build a freshly extracted story with no enrichment.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            summary: summary.into(),
            timestamp: timestamp.into(),
            source: TECHMEME_SOURCE.to_string(),
            content: None,
            reactions: None,
        }
    }
}

/// Reaction metrics from one discussion forum.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReactionRecord {
    /// Points / upvotes of the discussion thread.
    pub score: i64,
    /// Number of comments or replies.
    pub comment_count: i64,
    /// Short notable quotes, most notable first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<String>,
}

/// Outcome of fetching one article.
///
/// The fetcher returns exactly one of these per requested URL, in request order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ArticleResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ArticleResult {
    pub fn ok(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            summary: Some(summary.into()),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// The persisted cache slot.
///
/// # JSON Schema
///
/// ```text
/// { "cached_at": 1760781234.5, "stories": [Story, ...] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheEntry {
    /// Unix epoch seconds at which the stories were fetched.
    pub cached_at: f64,
    pub stories: Vec<Story>,
}

impl CacheEntry {
    /// Age of the entry in hours relative to `now` (epoch seconds).
    pub fn age_hours(&self, now: f64) -> f64 {
        (now - self.cached_at) / 3600.0
    }
}

/// Output of fetch-only mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchEnvelope {
    pub cached: bool,
    pub stories: Vec<Story>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_new_defaults() {
        let story = Story::new("Title", "https://example.com/a", "", "");
        assert_eq!(story.source, "techmeme");
        assert!(story.content.is_none());
        assert!(story.reactions.is_none());
    }

    #[test]
    fn test_story_serialization_omits_missing_enrichment() {
        let story = Story::new("Title", "https://example.com/a", "Sum", "2h");
        let json = serde_json::to_string(&story).unwrap();
        assert!(json.contains("\"title\":\"Title\""));
        assert!(!json.contains("content"));
        assert!(!json.contains("reactions"));
    }

    #[test]
    fn test_story_deserialization_tolerates_missing_optional_fields() {
        let json = r#"{"title": "T", "url": "https://x.test/", "source": "techmeme"}"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.summary, "");
        assert_eq!(story.timestamp, "");
    }

    #[test]
    fn test_reaction_record_quotes_default_empty() {
        let json = r#"{"score": 12, "comment_count": 3}"#;
        let record: ReactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.score, 12);
        assert!(record.quotes.is_empty());
    }

    #[test]
    fn test_cache_entry_wire_format() {
        let json = r#"{
            "cached_at": 1700000000.25,
            "stories": [{"title": "T", "url": "https://x.test/", "summary": "", "timestamp": "", "source": "techmeme"}]
        }"#;
        let entry: CacheEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.stories.len(), 1);
        assert_eq!(entry.cached_at, 1700000000.25);
    }

    #[test]
    fn test_cache_entry_age_hours() {
        let entry = CacheEntry {
            cached_at: 1_000.0,
            stories: vec![],
        };
        assert_eq!(entry.age_hours(1_000.0 + 1_800.0), 0.5);
    }

    #[test]
    fn test_article_result_constructors() {
        let ok = ArticleResult::ok("body", "sum");
        assert!(ok.success);
        assert_eq!(ok.summary.as_deref(), Some("sum"));
        let failed = ArticleResult::failed();
        assert!(!failed.success);
        assert!(failed.content.is_none());
    }
}
