use nc_core::{Cluster, DocumentStore, Embedder, Error, QueryHit, Result, ScriptWriter, Settings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clustering::cluster;
use crate::prompt::{build_prompt, BriefingMode, SYSTEM_PROMPT};
use crate::ranking::rank;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 15;

#[derive(Debug, Clone)]
pub struct BriefingConfig {
    pub query_text: String,
    pub query_results: usize,
    pub top_k: usize,
    pub similarity_threshold: f32,
}

impl From<&Settings> for BriefingConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            query_text: settings.query_text.clone(),
            query_results: settings.query_results,
            top_k: settings.top_k,
            similarity_threshold: settings.similarity_threshold,
        }
    }
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// One ranked article inside a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryArticle {
    pub title: String,
    pub link: String,
    pub source: String,
    pub text: String,
    pub score: f32,
}

impl From<(QueryHit, f32)> for StoryArticle {
    fn from((hit, score): (QueryHit, f32)) -> Self {
        Self {
            title: hit.metadata.title,
            link: hit.metadata.link,
            source: hit.metadata.source,
            text: hit.text,
            score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Briefing {
    pub mode: BriefingMode,
    pub query: String,
    /// Clusters of near-duplicate coverage, in rank order of their first article.
    pub stories: Vec<Cluster<StoryArticle>>,
    pub prompt: String,
    pub script: Option<String>,
}

/// Generation-time half of the pipeline: query the store, rank the
/// candidates, cluster the best ones and hand them to the script writer.
pub struct Briefer {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    writer: Option<Arc<dyn ScriptWriter>>,
    config: BriefingConfig,
}

impl fmt::Debug for Briefer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Briefer")
            .field("store", &"<dyn DocumentStore>")
            .field("embedder", &self.embedder.name())
            .field("writer", &self.writer.as_ref().map(|w| w.name().to_string()))
            .field("config", &self.config)
            .finish()
    }
}

impl Briefer {
    /// `embedder` should be cache-backed: title and query embeddings are
    /// requested on every briefing.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        writer: Option<Arc<dyn ScriptWriter>>,
        config: BriefingConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            writer,
            config,
        }
    }

    pub fn query_for_topic(&self, topic: Option<&str>) -> String {
        match topic.map(str::trim) {
            Some(topic) if !topic.is_empty() && !topic.eq_ignore_ascii_case("general") => {
                format!("Top {} news from the last day.", topic)
            }
            _ => self.config.query_text.clone(),
        }
    }

    /// Ranked, clustered stories for `query`.
    pub async fn stories(&self, query: &str) -> Result<Vec<Cluster<StoryArticle>>> {
        let hits = self.store.query(query, self.config.query_results).await?;
        info!("🔍 Store returned {} candidates", hits.len());
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut candidates = Vec::with_capacity(hits.len());
        for mut hit in hits {
            let embedding = match hit.embedding.take() {
                Some(embedding) => embedding,
                None => match self.embedder.embed(&hit.metadata.title).await {
                    Ok(embedding) => embedding,
                    Err(e) => {
                        warn!("Skipping {}: embedding failed: {}", hit.metadata.link, e);
                        continue;
                    }
                },
            };
            candidates.push((hit, embedding));
        }

        let ranked = rank(&query_embedding, candidates, self.config.top_k);
        debug!(
            "Top candidates: {:?}",
            ranked.iter().map(|r| (r.item.metadata.title.as_str(), r.score)).collect::<Vec<_>>()
        );

        let embeddings: Vec<Vec<f32>> = ranked.iter().map(|r| r.embedding.clone()).collect();
        let articles: Vec<StoryArticle> = ranked
            .into_iter()
            .map(|r| StoryArticle::from((r.item, r.score)))
            .collect();
        let stories = cluster(&embeddings, articles, self.config.similarity_threshold)?;
        info!("🧩 Grouped top candidates into {} stories", stories.len());
        Ok(stories)
    }

    pub async fn brief(
        &self,
        mode: BriefingMode,
        minutes: u32,
        topic: Option<&str>,
    ) -> Result<Briefing> {
        if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
            return Err(Error::InvalidInput(format!(
                "minutes must be between {} and {}, got {}",
                MIN_MINUTES, MAX_MINUTES, minutes
            )));
        }

        let query = self.query_for_topic(topic);
        let stories = self.stories(&query).await?;
        let prompt = build_prompt(mode, &stories, minutes);

        let script = match (&self.writer, stories.is_empty()) {
            (Some(writer), false) => {
                info!("✍️ Generating script with {}", writer.name());
                Some(writer.write_script(SYSTEM_PROMPT, &prompt).await?)
            }
            (_, true) => {
                warn!("No stored articles matched the query; skipping script generation");
                None
            }
            (None, false) => None,
        };

        Ok(Briefing {
            mode,
            query,
            stories,
            prompt,
            script,
        })
    }
}
