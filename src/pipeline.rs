//! The end-to-end briefing workflow.
//!
//! [`Orchestrator`] runs five stages, each handing a typed record to the next:
//!
//! 1. **Obtain** stories from the cache, or fetch the homepage and extract them
//!    ([`Obtained`]). A cache hit skips straight to stage 5.
//! 2. **Fetch** article content for every story URL ([`ArticleResult`] per story)
//! 3. **Merge** article results into the stories by position
//! 4. **Analyze** forum reactions for the merged stories
//! 5. **Render** the digest ([`Digest`])
//!
//! Only stage 1 can fail the run in normal operation (homepage unreachable or
//! no stories extracted). Collaborators breaking their length contract also
//! abort, since merging by position would pair the wrong records.
//! Per-story failures in stages 2 and 4 only degrade that story.

use crate::articles::ArticleFetcher;
use crate::cache::{DEFAULT_MAX_AGE_HOURS, StoryCache};
use crate::errors::DigestError;
use crate::models::{ArticleResult, FetchEnvelope, Story};
use crate::outputs::digest::render;
use crate::reactions::ReactionAnalyzer;
use crate::scrapers::HomepageSource;
use crate::scrapers::techmeme::extract;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Stories requested when the caller does not say.
pub const DEFAULT_STORY_COUNT: usize = 10;

/// Knobs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum number of stories in the output.
    pub count: usize,
    /// Consult the cache before fetching live.
    pub use_cache: bool,
    /// Cache entries at least this old are ignored.
    pub max_age_hours: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_STORY_COUNT,
            use_cache: true,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
        }
    }
}

/// Stage 1 output.
#[derive(Debug, Clone, PartialEq)]
pub struct Obtained {
    /// Whether the stories came from the cache.
    pub cached: bool,
    /// At most `count` stories, in homepage order.
    pub stories: Vec<Story>,
}

/// Final output of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub cached: bool,
    /// The stories as rendered, enrichment included.
    pub stories: Vec<Story>,
    pub text: String,
}

/// Drives the workflow over injected collaborators.
#[derive(Debug)]
pub struct Orchestrator<H, C, A, R> {
    homepage: H,
    cache: C,
    articles: A,
    reactions: R,
    config: PipelineConfig,
}

impl<H, C, A, R> Orchestrator<H, C, A, R>
where
    H: HomepageSource,
    C: StoryCache,
    A: ArticleFetcher,
    R: ReactionAnalyzer,
{
    pub fn new(homepage: H, cache: C, articles: A, reactions: R, config: PipelineConfig) -> Self {
        Self {
            homepage,
            cache,
            articles,
            reactions,
            config,
        }
    }

    /// Stage 1: cached stories if fresh, otherwise a live fetch.
    ///
    /// A live fetch writes the full extracted list to the cache, even when
    /// fewer stories were requested. Nothing is written when extraction comes
    /// back empty.
    #[instrument(level = "info", skip(self), fields(count = self.config.count))]
    pub async fn obtain_stories(&self) -> Result<Obtained, DigestError> {
        let count = self.config.count;

        if self.config.use_cache {
            if let Some(mut stories) = self.cache.read(self.config.max_age_hours).await {
                stories.truncate(count);
                info!(returned = stories.len(), "Using cached stories");
                return Ok(Obtained {
                    cached: true,
                    stories,
                });
            }
        }

        info!(url = %self.homepage.base_url(), "Fetching TechMeme stories");
        let html = self.homepage.fetch_homepage().await?;
        let mut stories = extract(&html, self.homepage.base_url(), usize::MAX);
        if stories.is_empty() {
            warn!("Homepage yielded no stories");
            return Err(DigestError::NoStories);
        }

        if let Err(e) = self.cache.write(&stories).await {
            warn!(error = %e, "Failed to write story cache; continuing");
        }

        stories.truncate(count);
        info!(returned = stories.len(), "Fetched live stories");
        Ok(Obtained {
            cached: false,
            stories,
        })
    }

    /// Fetch-only mode: stage 1 wrapped as the JSON envelope.
    pub async fn fetch_only(&self) -> Result<FetchEnvelope, DigestError> {
        let obtained = self.obtain_stories().await?;
        Ok(FetchEnvelope {
            cached: obtained.cached,
            stories: obtained.stories,
        })
    }

    /// Stages 2 and 3: fetch article content and merge it into the stories.
    #[instrument(level = "info", skip_all, fields(count = stories.len()))]
    pub async fn enrich_with_articles(
        &self,
        stories: Vec<Story>,
    ) -> Result<Vec<Story>, DigestError> {
        info!("Fetching {} articles", stories.len());
        let urls: Vec<String> = stories.iter().map(|s| s.url.clone()).collect();
        let results = self.articles.fetch_all(&urls).await;
        merge_articles(stories, results)
    }

    /// Stage 4: attach forum reactions.
    #[instrument(level = "info", skip_all, fields(count = stories.len()))]
    pub async fn analyze_reactions(&self, stories: Vec<Story>) -> Result<Vec<Story>, DigestError> {
        info!("Analyzing social reactions");
        let expected = stories.len();
        let analyzed = self.reactions.analyze(stories).await;
        if analyzed.len() != expected {
            return Err(DigestError::ReactionCountMismatch {
                expected,
                actual: analyzed.len(),
            });
        }
        Ok(analyzed)
    }

    /// Run every stage and return the rendered digest.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self) -> Result<Digest, DigestError> {
        let t0 = Instant::now();
        let obtained = self.obtain_stories().await?;

        let stories = if obtained.cached {
            info!("Cache hit; skipping enrichment");
            obtained.stories
        } else {
            let merged = self.enrich_with_articles(obtained.stories).await?;
            self.analyze_reactions(merged).await?
        };

        let text = render(&stories);
        info!(
            cached = obtained.cached,
            stories = stories.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Digest complete"
        );
        Ok(Digest {
            cached: obtained.cached,
            stories,
            text,
        })
    }
}

/// Stage 3: overlay article results onto stories by position.
///
/// A successful result replaces `content` and `summary`; a failed one leaves
/// the story exactly as extracted. The two lists must have equal length.
pub fn merge_articles(
    stories: Vec<Story>,
    results: Vec<ArticleResult>,
) -> Result<Vec<Story>, DigestError> {
    if stories.len() != results.len() {
        return Err(DigestError::ArticleCountMismatch {
            expected: stories.len(),
            actual: results.len(),
        });
    }

    Ok(stories
        .into_iter()
        .zip(results)
        .map(|(mut story, article)| {
            if article.success {
                story.content = Some(article.content.unwrap_or_default());
                story.summary = article.summary.unwrap_or_default();
            }
            story
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::errors::{FETCH_FAILED_MESSAGE, FetchError};
    use crate::models::{ReactionRecord, Reactions};
    use crate::reactions::HACKER_NEWS;
    use crate::scrapers::techmeme::TECHMEME_URL;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: f64 = 1_760_000_000.0;

    const HOMEPAGE: &str = r#"
        <html><body>
          <div class="story"><a class="ourh" href="https://a.test/1">One</a>
            <div class="intr">Homepage summary one</div><span class="dt">1h</span></div>
          <div class="story"><p>malformed, no headline link</p></div>
          <div class="story"><a class="ourh" href="/r/2">Two</a></div>
          <div class="story"><a class="ourh" href="https://a.test/3">Three</a>
            <div class="intr">Homepage summary three</div></div>
        </body></html>
    "#;

    struct StubHomepage {
        html: Result<String, FetchError>,
        calls: AtomicUsize,
    }

    impl StubHomepage {
        fn serving(html: &str) -> Self {
            Self {
                html: Ok(html.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                html: Err(FetchError::new(TECHMEME_URL, "timed out")),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HomepageSource for StubHomepage {
        fn base_url(&self) -> &str {
            TECHMEME_URL
        }

        async fn fetch_homepage(&self) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.html.clone()
        }
    }

    /// Fails every URL containing "/3", succeeds otherwise.
    #[derive(Default)]
    struct StubArticles {
        calls: AtomicUsize,
        drop_last: bool,
    }

    impl ArticleFetcher for StubArticles {
        async fn fetch_all(&self, urls: &[String]) -> Vec<ArticleResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results: Vec<ArticleResult> = urls
                .iter()
                .map(|u| {
                    if u.contains("/3") {
                        ArticleResult::failed()
                    } else {
                        ArticleResult::ok(format!("content of {u}"), format!("article summary of {u}"))
                    }
                })
                .collect();
            if self.drop_last {
                results.pop();
            }
            results
        }
    }

    /// Gives the first story a Hacker News record.
    #[derive(Default)]
    struct StubReactions {
        calls: AtomicUsize,
    }

    impl ReactionAnalyzer for StubReactions {
        async fn analyze(&self, mut stories: Vec<Story>) -> Vec<Story> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(first) = stories.first_mut() {
                let mut reactions = Reactions::new();
                reactions.insert(
                    HACKER_NEWS.to_string(),
                    ReactionRecord {
                        score: 321,
                        comment_count: 54,
                        quotes: vec!["This changes everything".to_string()],
                    },
                );
                first.reactions = Some(reactions);
            }
            stories
        }
    }

    type TestOrchestrator = Orchestrator<StubHomepage, MemoryCache, StubArticles, StubReactions>;

    fn orchestrator(homepage: StubHomepage, cache: MemoryCache, count: usize) -> TestOrchestrator {
        Orchestrator::new(
            homepage,
            cache,
            StubArticles::default(),
            StubReactions::default(),
            PipelineConfig {
                count,
                ..PipelineConfig::default()
            },
        )
    }

    fn cached_stories(n: usize) -> Vec<Story> {
        (0..n)
            .map(|i| Story::new(format!("Cached {i}"), format!("https://c.test/{i}"), "", ""))
            .collect()
    }

    #[tokio::test]
    async fn test_scenario_live_fetch_with_malformed_block() {
        let orch = orchestrator(StubHomepage::serving(HOMEPAGE), MemoryCache::at(NOW), 10);
        let digest = orch.run().await.unwrap();

        assert!(!digest.cached);
        assert_eq!(digest.stories.len(), 3);
        assert!(digest.text.contains("**1. One**"));
        assert!(digest.text.contains("**2. Two**"));
        assert!(digest.text.contains("**3. Three**"));
        assert!(!digest.text.contains("**4."));
        assert_eq!(orch.homepage.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.articles.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.reactions.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.cache.write_count(), 1);
    }

    #[tokio::test]
    async fn test_scenario_live_fetch_merges_enrichment() {
        let orch = orchestrator(StubHomepage::serving(HOMEPAGE), MemoryCache::at(NOW), 10);
        let digest = orch.run().await.unwrap();
        let [one, two, three] = digest.stories.as_slice() else {
            panic!("expected three stories");
        };

        assert_eq!(one.summary, "article summary of https://a.test/1");
        assert_eq!(one.content.as_deref(), Some("content of https://a.test/1"));
        assert_eq!(one.reactions.as_ref().unwrap()[HACKER_NEWS].score, 321);

        assert_eq!(two.url, "https://www.techmeme.com/r/2");
        assert_eq!(two.summary, "article summary of https://www.techmeme.com/r/2");

        // failed article: homepage summary kept, no content
        assert_eq!(three.summary, "Homepage summary three");
        assert!(three.content.is_none());
        assert!(three.reactions.is_none());

        assert!(digest.text.contains("💬 HN: 321 points, 54 comments"));
        assert!(digest.text.contains("🔥 Notable quote: \"This changes everything...\""));
    }

    #[tokio::test]
    async fn test_scenario_fresh_cache_short_circuits() {
        let cache = MemoryCache::holding(NOW, NOW - 30.0 * 60.0, cached_stories(5));
        let orch = orchestrator(StubHomepage::serving(HOMEPAGE), cache, 3);

        let digest = orch.run().await.unwrap();
        assert!(digest.cached);
        assert_eq!(digest.stories, cached_stories(3));
        assert_eq!(orch.homepage.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orch.articles.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orch.reactions.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orch.cache.write_count(), 0);

        let envelope = orch.fetch_only().await.unwrap();
        assert!(envelope.cached);
        assert_eq!(envelope.stories.len(), 3);
        assert_eq!(orch.homepage.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scenario_empty_homepage_is_reported_failure() {
        let html = r#"<div class="story"><span>nothing here</span></div>"#;
        let orch = orchestrator(StubHomepage::serving(html), MemoryCache::at(NOW), 10);

        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, DigestError::NoStories));
        assert_eq!(err.user_message(), FETCH_FAILED_MESSAGE);
        assert_eq!(orch.cache.write_count(), 0);
        assert_eq!(orch.articles.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_homepage_fetch_failure_is_reported_failure() {
        let orch = orchestrator(StubHomepage::failing(), MemoryCache::at(NOW), 10);
        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, DigestError::Homepage(_)));
        assert_eq!(err.user_message(), FETCH_FAILED_MESSAGE);
        assert_eq!(orch.cache.write_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_triggers_live_fetch_and_rewrite() {
        let cache = MemoryCache::holding(NOW, NOW - 3.0 * 3600.0, cached_stories(5));
        let orch = orchestrator(StubHomepage::serving(HOMEPAGE), cache, 10);

        let obtained = orch.obtain_stories().await.unwrap();
        assert!(!obtained.cached);
        assert_eq!(obtained.stories.len(), 3);
        assert_eq!(orch.homepage.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.cache.write_count(), 1);
    }

    #[tokio::test]
    async fn test_live_fetch_caches_full_list_but_returns_requested_count() {
        let orch = orchestrator(StubHomepage::serving(HOMEPAGE), MemoryCache::at(NOW), 1);

        let obtained = orch.obtain_stories().await.unwrap();
        assert_eq!(obtained.stories.len(), 1);
        assert_eq!(obtained.stories[0].title, "One");

        let stored = orch.cache.read(DEFAULT_MAX_AGE_HOURS).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_fetches_live() {
        let cache = MemoryCache::holding(NOW, NOW - 60.0, cached_stories(5));
        let orch = Orchestrator::new(
            StubHomepage::serving(HOMEPAGE),
            cache,
            StubArticles::default(),
            StubReactions::default(),
            PipelineConfig {
                use_cache: false,
                ..PipelineConfig::default()
            },
        );

        let envelope = orch.fetch_only().await.unwrap();
        assert!(!envelope.cached);
        assert_eq!(envelope.stories[0].title, "One");
        assert_eq!(orch.homepage.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_article_count_mismatch_aborts() {
        let orch = Orchestrator::new(
            StubHomepage::serving(HOMEPAGE),
            MemoryCache::at(NOW),
            StubArticles {
                drop_last: true,
                ..StubArticles::default()
            },
            StubReactions::default(),
            PipelineConfig::default(),
        );

        let err = orch.run().await.unwrap_err();
        assert!(matches!(
            err,
            DigestError::ArticleCountMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(orch.reactions.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_merge_maps_results_by_position_with_interleaved_failures() {
        let stories: Vec<Story> = (0..5)
            .map(|i| Story::new(format!("S{i}"), format!("https://m.test/{i}"), format!("orig {i}"), ""))
            .collect();
        let results = vec![
            ArticleResult::ok("c0", "new 0"),
            ArticleResult::failed(),
            ArticleResult::ok("c2", "new 2"),
            ArticleResult::failed(),
            ArticleResult {
                success: true,
                content: None,
                summary: None,
            },
        ];

        let merged = merge_articles(stories, results).unwrap();
        let summaries: Vec<&str> = merged.iter().map(|s| s.summary.as_str()).collect();
        assert_eq!(summaries, vec!["new 0", "orig 1", "new 2", "orig 3", ""]);
        let contents: Vec<Option<&str>> = merged.iter().map(|s| s.content.as_deref()).collect();
        assert_eq!(contents, vec![Some("c0"), None, Some("c2"), None, Some("")]);
        let titles: Vec<&str> = merged.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["S0", "S1", "S2", "S3", "S4"]);
    }

    #[test]
    fn test_merge_rejects_length_mismatch() {
        let stories = cached_stories(2);
        let err = merge_articles(stories, vec![ArticleResult::failed()]).unwrap_err();
        assert!(matches!(
            err,
            DigestError::ArticleCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.count, 10);
        assert!(config.use_cache);
        assert_eq!(config.max_age_hours, 2.0);
    }
}
