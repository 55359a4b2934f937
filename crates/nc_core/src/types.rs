use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::content_fingerprint;

/// A single feed item, identified by its link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// URL of the feed the article came from.
    pub source: String,
    pub published: Option<DateTime<Utc>>,
}

impl Article {
    pub fn fingerprint(&self) -> String {
        content_fingerprint(&self.title, &self.summary)
    }

    /// Text handed to the document store and the keyword filter.
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.title, self.summary)
    }

    pub fn to_document(&self) -> Document {
        Document {
            id: self.link.clone(),
            text: self.text(),
            metadata: DocumentMetadata {
                title: self.title.clone(),
                link: self.link.clone(),
                source: self.source.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub link: String,
    pub source: String,
}

/// Store-facing shape of an article. `id` is always the article link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// One result of a semantic query, in the store's relevance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub text: String,
    pub metadata: DocumentMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Persisted history of a link across ingestion runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(rename = "hash")]
    pub fingerprint: String,
    pub source: String,
}

/// Items judged to cover the same event. Never empty.
pub type Cluster<T> = Vec<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    New,
    Updated,
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            title: "FAA cuts flights".to_string(),
            summary: "Airlines reduce schedules.".to_string(),
            link: "https://news.example/faa".to_string(),
            source: "https://news.example/rss".to_string(),
            published: None,
        }
    }

    #[test]
    fn test_to_document() {
        let doc = article().to_document();
        assert_eq!(doc.id, "https://news.example/faa");
        assert_eq!(doc.text, "FAA cuts flights\n\nAirlines reduce schedules.");
        assert_eq!(doc.metadata.source, "https://news.example/rss");
    }

    #[test]
    fn test_seen_record_uses_hash_key() {
        let now = Utc::now();
        let record = SeenRecord {
            first_seen: now,
            last_seen: now,
            fingerprint: "abc".to_string(),
            source: "feed".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["hash"], "abc");
        assert!(value.get("fingerprint").is_none());
    }
}
