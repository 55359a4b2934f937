use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use nc_core::{Article, ArticleStatus, DocumentStore, Error, Result, SeenRecord, Settings};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

use crate::filters::{FreshnessFilter, KeywordFilter};
use crate::ingest_log::write_ingest_log;
use crate::logging::Logger;
use crate::resolver::FeedConfig;
use crate::seen::SeenStore;
use crate::source::{FeedSource, RawEntry};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub limit_per_feed: usize,
    pub concurrency: usize,
    pub freshness: FreshnessFilter,
    pub keywords: KeywordFilter,
    pub seen_retention: Option<Duration>,
    pub log_dir: Option<PathBuf>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for IngestOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            limit_per_feed: settings.limit_per_feed,
            concurrency: settings.fetch_concurrency.max(1),
            freshness: FreshnessFilter::hours(settings.freshness_hours),
            keywords: KeywordFilter::new(&settings.keywords),
            seen_retention: settings.seen_retention_days.map(Duration::days),
            log_dir: settings.log_dir.clone(),
        }
    }
}

/// What happened to one feed during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedSummary {
    pub url: String,
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub stale: usize,
    /// Entries without a link.
    pub skipped: usize,
    /// Entries whose link came up again later in the same run.
    pub duplicates: usize,
    /// Fetch or parse error, when the feed was skipped entirely.
    pub failed: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Articles written to the document store this run.
    Ingested(Vec<Article>),
    /// Nothing new survived; the briefing should recap stored coverage.
    NoNewContent,
}

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub feeds: Vec<FeedSummary>,
    pub outcome: IngestOutcome,
    pub seen_records: usize,
}

impl IngestReport {
    pub fn accepted(&self) -> &[Article] {
        match &self.outcome {
            IngestOutcome::Ingested(articles) => articles,
            IngestOutcome::NoNewContent => &[],
        }
    }

    pub fn has_new_content(&self) -> bool {
        matches!(self.outcome, IngestOutcome::Ingested(_))
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| f.failed.is_some()).count()
    }
}

/// Ingest-time half of the pipeline: fetch feeds, drop what was already
/// seen or is too old, keep relevant articles and upsert them.
pub struct IngestManager {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn DocumentStore>,
    feeds: FeedConfig,
    seen_path: PathBuf,
    options: IngestOptions,
    semaphore: Arc<Semaphore>,
    run_lock: Mutex<()>,
}

impl IngestManager {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn DocumentStore>,
        feeds: FeedConfig,
        seen_path: PathBuf,
        options: IngestOptions,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(options.concurrency.max(1))),
            source,
            store,
            feeds,
            seen_path,
            options,
            run_lock: Mutex::new(()),
        }
    }

    pub fn feeds(&self) -> &FeedConfig {
        &self.feeds
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub async fn ingest(&self, user: Option<&str>) -> Result<IngestReport> {
        self.ingest_at(user, Utc::now()).await
    }

    /// Run one ingest pass as of `now`. Runs on the same manager are
    /// serialized so the seen-state has a single writer.
    pub async fn ingest_at(&self, user: Option<&str>, now: DateTime<Utc>) -> Result<IngestReport> {
        let _guard = self.run_lock.lock().await;
        let logger = Logger::new().with_prefix("[ingest]".to_string());

        let urls = self.feeds.resolve(user);
        if urls.is_empty() {
            logger.warn("No feeds resolved; nothing to fetch");
        } else {
            logger.info(&format!("📡 Fetching {} feeds", urls.len()));
        }

        let fetched = self.fetch_all(&urls, &logger).await;

        let mut seen = SeenStore::load(&self.seen_path).await;
        if let Some(max_age) = self.options.seen_retention {
            let pruned = seen.prune(now, max_age);
            if pruned > 0 {
                logger.info(&format!("🧹 Pruned {} seen records", pruned));
            }
        }

        // One version per link, the last one fetched wins.
        let mut summaries: Vec<FeedSummary> = Vec::with_capacity(fetched.len());
        let mut collected: Vec<(usize, Article)> = Vec::new();
        let mut by_link: HashMap<String, usize> = HashMap::new();

        for (url, result) in fetched {
            let feed = summaries.len();
            summaries.push(FeedSummary {
                url: url.clone(),
                ..Default::default()
            });
            let entries = match result {
                Ok(entries) => entries,
                Err(e) => {
                    summaries[feed].failed = Some(e.to_string());
                    continue;
                }
            };
            summaries[feed].fetched = entries.len();

            for entry in entries {
                let Some(article) = entry.into_article(&url) else {
                    summaries[feed].skipped += 1;
                    continue;
                };
                match by_link.get(&article.link) {
                    Some(&i) => {
                        summaries[collected[i].0].duplicates += 1;
                        collected[i] = (feed, article);
                    }
                    None => {
                        by_link.insert(article.link.clone(), collected.len());
                        collected.push((feed, article));
                    }
                }
            }
        }

        let mut candidates: Vec<Article> = Vec::new();
        let mut previous: HashMap<String, Option<SeenRecord>> = HashMap::new();

        for (feed, article) in collected {
            let status = seen.status(&article);
            let prior = seen.observe(&article, now);
            let summary = &mut summaries[feed];

            match status {
                ArticleStatus::Unchanged => summary.unchanged += 1,
                _ if !self.options.freshness.is_fresh(&article, now) => summary.stale += 1,
                ArticleStatus::New | ArticleStatus::Updated => {
                    if status == ArticleStatus::New {
                        summary.new += 1;
                    } else {
                        summary.updated += 1;
                    }
                    previous.insert(article.link.clone(), prior);
                    candidates.push(article);
                }
            }
        }

        for summary in summaries.iter().filter(|s| s.failed.is_none()) {
            logger.clone().with_prefix(format!("[{}]", summary.url)).info(&format!(
                "{} fetched, 🆕 {} new, 📝 {} updated, ⏭️ {} unchanged, 🕰️ {} stale, \
                 {} repeated, {} without link",
                summary.fetched,
                summary.new,
                summary.updated,
                summary.unchanged,
                summary.stale,
                summary.duplicates,
                summary.skipped
            ));
        }

        let accepted = if candidates.is_empty() {
            candidates
        } else {
            let count = candidates.len();
            let kept = self.options.keywords.apply(candidates);
            logger.info(&format!(
                "🔎 {} of {} candidates kept by keyword filter",
                kept.len(),
                count
            ));
            kept
        };

        if accepted.is_empty() {
            seen.save().await?;
            logger.info("😴 No new content; briefing will recap stored coverage");
            return Ok(IngestReport {
                feeds: summaries,
                outcome: IngestOutcome::NoNewContent,
                seen_records: seen.len(),
            });
        }

        let documents: Vec<_> = accepted.iter().map(Article::to_document).collect();
        if let Err(e) = self.store.upsert(&documents).await {
            for article in &accepted {
                if let Some(prior) = previous.remove(&article.link) {
                    seen.restore(&article.link, prior);
                }
            }
            seen.save().await?;
            logger.error(&format!("Upsert of {} documents failed: {}", documents.len(), e));
            return Err(e);
        }
        seen.save().await?;
        logger.info(&format!("💾 Stored {} articles", accepted.len()));

        if let Some(dir) = &self.options.log_dir {
            match write_ingest_log(dir, now, &accepted).await {
                Ok(path) => logger.debug(&format!("Wrote ingest log {}", path.display())),
                Err(e) => logger.warn(&format!("Cannot write ingest log: {}", e)),
            }
        }

        Ok(IngestReport {
            feeds: summaries,
            outcome: IngestOutcome::Ingested(accepted),
            seen_records: seen.len(),
        })
    }

    async fn fetch_all(
        &self,
        urls: &[String],
        logger: &Logger,
    ) -> Vec<(String, Result<Vec<RawEntry>>)> {
        let fetches = urls.iter().map(|url| {
            let semaphore = self.semaphore.clone();
            let source = self.source.clone();
            let limit = self.options.limit_per_feed;
            async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => source.fetch(url, limit).await,
                    Err(e) => Err(Error::External(e.into())),
                };
                if let Err(e) = &result {
                    logger
                        .clone()
                        .with_prefix(format!("[{}]", url))
                        .warn(&format!("Skipping feed: {}", e));
                }
                (url.clone(), result)
            }
        });
        join_all(fetches).await
    }
}
