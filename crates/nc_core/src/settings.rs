use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result};

pub const DEFAULT_QUERY: &str = "Top local Atlanta, Georgia news from the last day, \
    plus major national AND AI tech stories if relevant.";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "atlanta",
    "georgia",
    "artificial intelligence",
    "openai",
    "technology",
    "congress",
    "white house",
    "supreme court",
    "election",
    "economy",
];

/// Runtime settings for the pipeline.
///
/// Read from the environment by [`Settings::from_env`]; binaries override
/// individual fields from their command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub feeds_file: PathBuf,
    pub user_feeds_file: PathBuf,
    /// Inline feed list, takes precedence over the feed files when non-empty.
    pub inline_feeds: Vec<String>,
    pub keywords: Vec<String>,
    pub seen_retention_days: Option<i64>,
    pub log_dir: Option<PathBuf>,
    pub limit_per_feed: usize,
    pub fetch_concurrency: usize,
    pub freshness_hours: i64,
    pub query_text: String,
    pub query_results: usize,
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    /// Read the script aloud after writing it.
    pub speech_enabled: bool,
    pub speech_model: String,
    pub speech_voice: String,
    pub chroma_url: String,
    pub collection: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_data_dir(PathBuf::from("data"))
    }
}

impl Settings {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            feeds_file: data_dir.join("feeds.json"),
            user_feeds_file: data_dir.join("user_feeds.json"),
            data_dir,
            inline_feeds: Vec::new(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            seen_retention_days: None,
            log_dir: None,
            limit_per_feed: 20,
            fetch_concurrency: 8,
            freshness_hours: 36,
            query_text: DEFAULT_QUERY.to_string(),
            query_results: 15,
            top_k: 7,
            similarity_threshold: 0.6,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            speech_enabled: true,
            speech_model: "gpt-4o-mini-tts".to_string(),
            speech_voice: "alloy".to_string(),
            chroma_url: "http://localhost:8000".to_string(),
            collection: "news_articles".to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = get("NC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));
        let mut settings = Self::with_data_dir(data_dir);

        if let Some(path) = get("NC_FEEDS_FILE") {
            settings.feeds_file = PathBuf::from(path);
        }
        if let Some(path) = get("NC_USER_FEEDS_FILE") {
            settings.user_feeds_file = PathBuf::from(path);
        }
        if let Some(feeds) = get("NEWS_FEEDS") {
            settings.inline_feeds = split_list(&feeds);
        }
        if let Some(keywords) = get("NC_KEYWORDS") {
            settings.keywords = split_list(&keywords);
        }
        if let Some(days) = get("NC_SEEN_RETENTION_DAYS") {
            settings.seen_retention_days = Some(parse("NC_SEEN_RETENTION_DAYS", &days)?);
        }
        settings.log_dir = get("NC_LOG_DIR").map(PathBuf::from);
        if let Some(limit) = get("NC_LIMIT_PER_FEED") {
            settings.limit_per_feed = parse("NC_LIMIT_PER_FEED", &limit)?;
        }
        if let Some(threshold) = get("NC_SIMILARITY_THRESHOLD") {
            settings.similarity_threshold = parse("NC_SIMILARITY_THRESHOLD", &threshold)?;
        }
        if let Some(query) = get("NC_QUERY") {
            settings.query_text = query;
        }

        settings.openai_api_key = get("OPENAI_API_KEY");
        if let Some(url) = get("OPENAI_BASE_URL") {
            settings.openai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("NC_EMBEDDING_MODEL") {
            settings.embedding_model = model;
        }
        if let Some(model) = get("NC_CHAT_MODEL") {
            settings.chat_model = model;
        }
        if let Some(enabled) = get("NC_SPEECH") {
            settings.speech_enabled = parse("NC_SPEECH", &enabled.to_lowercase())?;
        }
        if let Some(model) = get("NC_SPEECH_MODEL") {
            settings.speech_model = model;
        }
        if let Some(voice) = get("NC_SPEECH_VOICE") {
            settings.speech_voice = voice;
        }

        let host = get("CHROMA_HOST").unwrap_or_else(|| "localhost".to_string());
        let port = get("CHROMA_PORT").unwrap_or_else(|| "8000".to_string());
        settings.chroma_url = format!("http://{}:{}", host, port);

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "similarity threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.top_k == 0 || self.query_results == 0 {
            return Err(Error::Config(
                "top_k and query_results must be positive".to_string(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(Error::Config("fetch_concurrency must be positive".to_string()));
        }
        Ok(())
    }

    /// Move every data-dir relative path under `data_dir`. Feed files that
    /// were set explicitly stay where they are.
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        if self.feeds_file == self.data_dir.join("feeds.json") {
            self.feeds_file = data_dir.join("feeds.json");
        }
        if self.user_feeds_file == self.data_dir.join("user_feeds.json") {
            self.user_feeds_file = data_dir.join("user_feeds.json");
        }
        self.data_dir = data_dir;
    }

    pub fn seen_path(&self) -> PathBuf {
        self.data_dir.join("seen.json")
    }

    pub fn embedding_cache_path(&self) -> PathBuf {
        self.data_dir.join("cache").join("embeddings_cache.json")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("output")
    }

    pub fn audio_path(&self, stamp: &str) -> PathBuf {
        self.output_dir().join(format!("podcast_{}.mp3", stamp))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| Error::Config(format!("invalid value for {}: {} ({})", key, raw, e)))
}
