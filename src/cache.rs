//! Single-slot, time-to-live story cache.
//!
//! There is exactly one cache entry: the most recent successful homepage
//! fetch. Reading checks its age against a maximum; writing replaces it
//! entirely. There is no key, no history and no eviction beyond overwrite.
//!
//! # File Layout
//!
//! ```text
//! ~/.cache/technews/
//! └── stories.json   { "cached_at": <epoch secs>, "stories": [...] }
//! ```
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader sees either the old entry or the new one. A file that fails to parse
//! (torn, truncated, hand-edited) reads as a miss.

use crate::errors::CacheError;
use crate::models::{CacheEntry, Story};
use crate::utils::epoch_now;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Default maximum age before a cached fetch is considered stale.
pub const DEFAULT_MAX_AGE_HOURS: f64 = 2.0;

/// `~/.cache/technews/stories.json`, falling back to the temp dir when no
/// home directory is known.
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".cache")
        .join("technews")
        .join("stories.json")
}

/// The story cache as seen by the orchestrator.
pub trait StoryCache {
    /// Return the stored stories if an entry exists, parses, and is younger
    /// than `max_age_hours`. Every other case is a miss, never an error.
    async fn read(&self, max_age_hours: f64) -> Option<Vec<Story>>;

    /// Replace the stored entry with `stories`, stamped with the current time.
    async fn write(&self, stories: &[Story]) -> Result<(), CacheError>;
}

/// Whether an entry fetched at `cached_at` is still fresh at `now`.
pub fn is_fresh(entry: &CacheEntry, now: f64, max_age_hours: f64) -> bool {
    entry.age_hours(now) < max_age_hours
}

/// JSON file backed [`StoryCache`].
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
    clock: fn() -> f64,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            clock: epoch_now,
        }
    }

    /// Use `clock` (epoch seconds) instead of the system clock.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> f64) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stories.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }

    async fn load_entry(&self) -> Option<CacheEntry> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No readable cache file");
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cache file unparseable; treating as miss");
                None
            }
        }
    }
}

impl StoryCache for FileCache {
    #[instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    async fn read(&self, max_age_hours: f64) -> Option<Vec<Story>> {
        let entry = self.load_entry().await?;
        let now = (self.clock)();
        let age_hours = entry.age_hours(now);

        if !is_fresh(&entry, now, max_age_hours) {
            info!(age_hours, max_age_hours, "Cache entry is stale");
            return None;
        }
        if entry.stories.is_empty() {
            debug!("Cache entry holds no stories; treating as miss");
            return None;
        }
        info!(age_hours, count = entry.stories.len(), "Cache hit");
        Some(entry.stories)
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = stories.len()))]
    async fn write(&self, stories: &[Story]) -> Result<(), CacheError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| CacheError::NoParent(self.path.display().to_string()))?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }

        let entry = CacheEntry {
            cached_at: (self.clock)(),
            stories: stories.to_vec(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json).await?;
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        info!("Wrote story cache");
        Ok(())
    }
}

/// In-memory [`StoryCache`] for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryCache {
    pub entry: std::sync::Mutex<Option<CacheEntry>>,
    pub writes: std::sync::atomic::AtomicUsize,
    pub now: f64,
}

#[cfg(test)]
impl MemoryCache {
    /// An empty cache whose clock reads `now`.
    pub fn at(now: f64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// A cache already holding `stories`, fetched at `cached_at`.
    pub fn holding(now: f64, cached_at: f64, stories: Vec<Story>) -> Self {
        let cache = Self::at(now);
        *cache.entry.lock().unwrap() = Some(CacheEntry { cached_at, stories });
        cache
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl StoryCache for MemoryCache {
    async fn read(&self, max_age_hours: f64) -> Option<Vec<Story>> {
        let guard = self.entry.lock().unwrap();
        let entry = guard.as_ref()?;
        (is_fresh(entry, self.now, max_age_hours) && !entry.stories.is_empty())
            .then(|| entry.stories.clone())
    }

    async fn write(&self, stories: &[Story]) -> Result<(), CacheError> {
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.entry.lock().unwrap() = Some(CacheEntry {
            cached_at: self.now,
            stories: stories.to_vec(),
        });
        Ok(())
    }
}
