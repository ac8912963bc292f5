//! JSON output for fetch-only mode.
//!
//! Fetch-only mode skips enrichment and prints the stories as obtained, along
//! with whether they came from the cache:
//!
//! ```text
//! { "cached": true, "stories": [ {...}, ... ] }
//! ```

use crate::models::FetchEnvelope;

/// Serialize the envelope as pretty-printed JSON.
pub fn envelope_to_json(envelope: &FetchEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(envelope)
}
