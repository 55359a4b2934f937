use chrono::{DateTime, Duration, Utc};
use nc_core::{write_atomic, Article, ArticleStatus, Result, SeenRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persisted `link -> SeenRecord` map used to recognise articles across runs.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
    records: BTreeMap<String, SeenRecord>,
}

impl SeenStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Load the store at `path`. Missing or unreadable files load empty.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Seen-state {} is corrupt, starting empty: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read seen-state {}, starting empty: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        debug!("Loaded {} seen records from {}", records.len(), path.display());
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole file through a sibling temp file and a rename.
    pub async fn save(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.records)?;
        write_atomic(&self.path, &json).await
    }

    pub fn get(&self, link: &str) -> Option<&SeenRecord> {
        self.records.get(link)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compare `article` with what was recorded for its link.
    pub fn status(&self, article: &Article) -> ArticleStatus {
        match self.records.get(&article.link) {
            None => ArticleStatus::New,
            Some(record) if record.fingerprint == article.fingerprint() => ArticleStatus::Unchanged,
            Some(_) => ArticleStatus::Updated,
        }
    }

    /// Record that `article` was seen at `now` and return the previous record.
    /// `first_seen` is kept from the first observation.
    pub fn observe(&mut self, article: &Article, now: DateTime<Utc>) -> Option<SeenRecord> {
        let fingerprint = article.fingerprint();
        let previous = self.records.get(&article.link).cloned();
        let record = SeenRecord {
            first_seen: previous.as_ref().map_or(now, |p| p.first_seen),
            last_seen: now,
            fingerprint,
            source: article.source.clone(),
        };
        self.records.insert(article.link.clone(), record);
        previous
    }

    /// Put back the record `observe` replaced, or drop the link if it was new.
    pub fn restore(&mut self, link: &str, previous: Option<SeenRecord>) {
        match previous {
            Some(record) => {
                self.records.insert(link.to_string(), record);
            }
            None => {
                self.records.remove(link);
            }
        }
    }

    /// Drop records not seen within `max_age` of `now`. Returns how many went.
    pub fn prune(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| now - record.last_seen <= max_age);
        before - self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(link: &str, summary: &str) -> Article {
        Article {
            title: "Title".to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            source: "https://feed.example/rss".to_string(),
            published: None,
        }
    }

    #[test]
    fn test_classification() {
        let mut store = SeenStore::empty("unused.json");
        let now = Utc::now();
        let a = article("https://a", "one");

        assert_eq!(store.status(&a), ArticleStatus::New);
        assert!(store.observe(&a, now).is_none());
        assert_eq!(store.status(&a), ArticleStatus::Unchanged);
        assert_eq!(store.status(&article("https://a", "two")), ArticleStatus::Updated);
    }

    #[test]
    fn test_first_seen_is_kept() {
        let mut store = SeenStore::empty("unused.json");
        let t0 = Utc::now();
        let t1 = t0 + Duration::hours(2);

        store.observe(&article("https://a", "one"), t0);
        let previous = store.observe(&article("https://a", "two"), t1).unwrap();
        assert_eq!(previous.last_seen, t0);

        let record = store.get("https://a").unwrap();
        assert_eq!(record.first_seen, t0);
        assert_eq!(record.last_seen, t1);
        assert_eq!(record.fingerprint, article("https://a", "two").fingerprint());
    }

    #[test]
    fn test_restore() {
        let mut store = SeenStore::empty("unused.json");
        let now = Utc::now();

        let previous = store.observe(&article("https://new", "x"), now);
        store.restore("https://new", previous);
        assert!(store.get("https://new").is_none());

        store.observe(&article("https://a", "one"), now);
        let previous = store.observe(&article("https://a", "two"), now);
        store.restore("https://a", previous);
        assert_eq!(store.status(&article("https://a", "one")), ArticleStatus::Unchanged);
    }

    #[test]
    fn test_prune() {
        let mut store = SeenStore::empty("unused.json");
        let now = Utc::now();
        store.observe(&article("https://old", "x"), now - Duration::days(40));
        store.observe(&article("https://recent", "x"), now - Duration::days(2));

        assert_eq!(store.prune(now, Duration::days(30)), 1);
        assert!(store.get("https://old").is_none());
        assert!(store.get("https://recent").is_some());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("seen.json");

        let mut store = SeenStore::load(&path).await;
        assert!(store.is_empty());
        store.observe(&article("https://a", "one"), Utc::now());
        store.save().await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"hash\""));
        assert!(!path.with_file_name("seen.json.tmp").exists());

        let loaded = SeenStore::load(&path).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("https://a"), store.get("https://a"));
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(SeenStore::load(&path).await.is_empty());
    }
}
