//! Plain-text digest rendering.
//!
//! [`render`] is a pure function: the same story list always renders to the
//! same bytes. Fields a story does not have produce no output at all.
//!
//! # Layout
//!
//! ```text
//! 📰 **Tech News Briefing**
//!
//! **1. Headline**
//!    🔗 https://example.com/story
//!    📝 First 200 characters of the summary...
//!    💬 HN: 120 points, 45 comments
//!    🔥 Notable quote: "First 100 characters of the first quote..."
//!
//! ```

use crate::models::Story;
use crate::utils::truncate_chars;

pub const HEADER: &str = "📰 **Tech News Briefing**";
pub const SUMMARY_CHARS: usize = 200;
pub const QUOTE_CHARS: usize = 100;

/// Reaction sources that get a line in the digest, in display order.
pub const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("hacker_news", "HN"),
    ("reddit", "Reddit"),
    ("lobsters", "Lobsters"),
];

/// Render enriched stories as a numbered digest.
pub fn render(stories: &[Story]) -> String {
    let mut lines = vec![HEADER.to_string(), String::new()];

    for (i, story) in stories.iter().enumerate() {
        lines.push(format!("**{}. {}**", i + 1, story.title));
        lines.push(format!("   🔗 {}", story.url));

        if !story.summary.is_empty() {
            lines.push(format!(
                "   📝 {}...",
                truncate_chars(&story.summary, SUMMARY_CHARS)
            ));
        }

        if let Some(reactions) = &story.reactions {
            for (key, label) in KNOWN_SOURCES {
                let Some(record) = reactions.get(*key) else {
                    continue;
                };
                lines.push(format!(
                    "   💬 {}: {} points, {} comments",
                    label, record.score, record.comment_count
                ));
                if let Some(quote) = record.quotes.first() {
                    lines.push(format!(
                        "   🔥 Notable quote: \"{}...\"",
                        truncate_chars(quote, QUOTE_CHARS)
                    ));
                }
            }
        }

        lines.push(String::new());
    }

    lines.join("\n")
}
