//! Utility functions for string handling, time, and HTTP client setup.
//!
//! This module provides helper functions used throughout the application:
//! - Char-safe truncation for logging and rendering
//! - Whitespace normalization for scraped text
//! - Wall-clock time in epoch seconds for cache freshness
//! - The shared `reqwest` client with a bounded timeout, plus text/JSON GET helpers

use crate::errors::FetchError;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

/// Browser-like user agent; some sites refuse requests without one.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Return at most the first `max` characters of `s`.
///
/// Counts Unicode scalar values, so it never splits a multi-byte character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Current wall-clock time as fractional Unix epoch seconds.
pub fn epoch_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Build the HTTP client shared by every network collaborator.
#[instrument(level = "debug")]
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    debug!(?timeout, "Built HTTP client");
    Ok(client)
}

/// GET `url` and return the body as text.
///
/// Non-2xx statuses count as failures. Every transport error is reported as a
/// single [`FetchError`].
#[instrument(level = "debug", skip(client))]
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| FetchError::from_reqwest(url, &e))?;
    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, &e))
}

/// GET `url` and decode the JSON body into `T`.
#[instrument(level = "debug", skip(client))]
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| FetchError::from_reqwest(url, &e))?;
    response
        .json::<T>()
        .await
        .map_err(|e| FetchError::from_reqwest(url, &e))
}
