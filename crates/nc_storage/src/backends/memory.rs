use async_trait::async_trait;
use nc_core::{
    cosine_similarity, write_atomic, Document, DocumentStore, Embedder, QueryHit, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    document: Document,
    embedding: Vec<f32>,
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Vec<StoredDocument>,
}

impl MemoryStore {
    fn upsert(&mut self, document: Document, embedding: Vec<f32>) {
        if let Some(existing) = self.documents.iter_mut().find(|d| d.document.id == document.id) {
            existing.document = document;
            existing.embedding = embedding;
        } else {
            self.documents.push(StoredDocument { document, embedding });
        }
    }

    fn query(&self, embedding: &[f32], limit: usize) -> Vec<QueryHit> {
        let mut scored: Vec<(f32, &StoredDocument)> = self
            .documents
            .iter()
            .map(|d| (cosine_similarity(embedding, &d.embedding), d))
            .collect();
        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, d)| QueryHit {
                text: d.document.text.clone(),
                metadata: d.document.metadata.clone(),
                embedding: Some(d.embedding.clone()),
            })
            .collect()
    }

    fn delete(&mut self, id: &str) {
        self.documents.retain(|d| d.document.id != id);
    }
}

/// Document store kept in process memory, optionally mirrored to a JSON
/// snapshot so that separate runs see the same collection.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    embedder: Arc<dyn Embedder>,
    snapshot: Option<PathBuf>,
}

impl MemoryStorage {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
            embedder,
            snapshot: None,
        }
    }

    /// Open a snapshot-backed store. A missing or unreadable snapshot starts empty.
    pub async fn open(path: PathBuf, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let documents = load_snapshot(&path).await;
        debug!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Self {
            store: Arc::new(RwLock::new(MemoryStore { documents })),
            embedder,
            snapshot: Some(path),
        })
    }

    async fn persist(&self, store: &MemoryStore) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(&store.documents)?;
        write_atomic(path, &bytes).await
    }
}

async fn load_snapshot(path: &Path) -> Vec<StoredDocument> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_slice(&bytes) {
        Ok(documents) => documents,
        Err(e) => {
            warn!("Ignoring corrupt store snapshot {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStorage {
    async fn upsert(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut embedded = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = self.embedder.embed(&document.text).await?;
            embedded.push((document.clone(), embedding));
        }

        let mut store = self.store.write().await;
        for (document, embedding) in embedded {
            store.upsert(document, embedding);
        }
        self.persist(&store).await
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>> {
        if self.store.read().await.documents.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(text).await?;
        let store = self.store.read().await;
        Ok(store.query(&embedding, limit))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete(id);
        self.persist(&store).await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.read().await.documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::{Article, Error};

    /// Maps a couple of words onto fixed axes.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn name(&self) -> &str {
            "axis"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            Ok(vec![
                if text.contains("flight") { 1.0 } else { 0.0 },
                if text.contains("model") { 1.0 } else { 0.0 },
            ])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::Inference("offline".to_string()))
        }
    }

    fn article(link: &str, title: &str, summary: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            source: "https://feed.example/rss".to_string(),
            published: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let storage = MemoryStorage::new(Arc::new(AxisEmbedder));
        let first = article("https://a", "Flights cut", "old");
        let second = article("https://a", "Flights cut", "new");
        storage.upsert(&[first.to_document()]).await.unwrap();
        storage.upsert(&[second.to_document()]).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 1);

        let hits = storage.query("flight", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].text.ends_with("new"));
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let storage = MemoryStorage::new(Arc::new(AxisEmbedder));
        storage
            .upsert(&[
                article("https://model", "New model released", "").to_document(),
                article("https://flight", "Flight delays", "").to_document(),
            ])
            .await
            .unwrap();

        let hits = storage.query("flight news", 2).await.unwrap();
        assert_eq!(hits[0].metadata.link, "https://flight");
        assert_eq!(hits[1].metadata.link, "https://model");
        assert!(hits[0].embedding.is_some());
    }

    #[tokio::test]
    async fn test_failed_embedding_stores_nothing() {
        let storage = MemoryStorage::new(Arc::new(FailingEmbedder));
        let result = storage.upsert(&[article("https://a", "t", "s").to_document()]).await;
        assert!(result.is_err());
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = MemoryStorage::open(path.clone(), Arc::new(AxisEmbedder)).await.unwrap();
        storage.upsert(&[article("https://a", "Flight", "s").to_document()]).await.unwrap();
        drop(storage);

        let reopened = MemoryStorage::open(path.clone(), Arc::new(AxisEmbedder)).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        reopened.delete("https://a").await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"{not json").unwrap();

        let storage = MemoryStorage::open(path, Arc::new(AxisEmbedder)).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
