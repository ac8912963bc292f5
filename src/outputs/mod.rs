//! Output generation for the two run modes.
//!
//! # Submodules
//!
//! - [`digest`]: Renders enriched stories as the human-readable briefing
//! - [`json`]: Serializes the fetch-only `{cached, stories}` envelope
//!
//! Both write nothing themselves; `main` prints the returned string to stdout.

pub mod digest;
pub mod json;
