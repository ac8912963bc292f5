//! Error types for the fetch, cache and pipeline stages.
//!
//! The taxonomy mirrors how failures propagate:
//! - [`FetchError`]: one HTTP request failed (timeout, connect, status, body)
//! - [`CacheError`]: writing the cache slot failed; never fatal to a run
//! - [`DigestError`]: a stage-level failure that aborts the whole run
//!
//! Per-item failures (one malformed story block, one article, one reaction
//! lookup) are not errors at this level; they degrade the affected story only.

use thiserror::Error;

/// Message shown to the user when no stories could be obtained.
pub const FETCH_FAILED_MESSAGE: &str = "❌ Could not fetch stories from TechMeme";

/// A single HTTP fetch failed.
///
/// Transport-specific errors are flattened into a message so callers see one
/// failure shape regardless of whether it was a timeout, a refused connection
/// or a bad status.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("request to {url} failed: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Collapse a `reqwest` error into a [`FetchError`] for `url`.
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "timed out".to_string()
        } else if e.is_connect() {
            "connection failed".to_string()
        } else if let Some(status) = e.status() {
            format!("HTTP status {status}")
        } else {
            e.to_string()
        };
        Self::new(url, message)
    }
}

/// Writing the cache slot failed.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache path has no parent directory: {0}")]
    NoParent(String),
}

/// A failure that aborts the run.
#[derive(Error, Debug)]
pub enum DigestError {
    /// Stage 1 produced no stories.
    #[error("no stories could be extracted from the homepage")]
    NoStories,

    /// Stage 1 could not reach the homepage at all.
    #[error("homepage fetch failed: {0}")]
    Homepage(#[from] FetchError),

    /// The article fetcher broke its positional contract.
    #[error("article fetcher returned {actual} results for {expected} stories")]
    ArticleCountMismatch { expected: usize, actual: usize },

    /// The reaction analyzer returned a list of a different length.
    #[error("reaction analyzer returned {actual} stories for {expected} inputs")]
    ReactionCountMismatch { expected: usize, actual: usize },
}

impl DigestError {
    /// The line printed to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            DigestError::NoStories | DigestError::Homepage(_) => FETCH_FAILED_MESSAGE.to_string(),
            other => format!("❌ {other}"),
        }
    }
}
