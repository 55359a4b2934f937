use async_trait::async_trait;
use nc_core::{fingerprint, write_atomic, Embedder, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Content-addressed embedding cache persisted as a JSON object of
/// `hex digest -> [f32]`.
///
/// Entries are never replaced or evicted. The file is read once on open and
/// rewritten in full after every new entry; writes go through a single lock.
pub struct EmbeddingCache {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Vec<f32>>>,
}

impl EmbeddingCache {
    /// Cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open the cache file at `path`. Missing or corrupt files yield an empty cache.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;
        debug!("Embedding cache {} holds {} entries", path.display(), entries.len());
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Return the vector cached under `key`, or run `compute`, store its result
    /// and persist the cache before returning it.
    ///
    /// A failed computation leaves the cache untouched.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<Vec<f32>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<f32>>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let computed = compute().await?;

        let mut entries = self.entries.lock().await;
        // another caller may have filled the key while we were computing
        if let Some(existing) = entries.get(key) {
            return Ok(existing.clone());
        }
        entries.insert(key.to_string(), computed.clone());
        if let Some(path) = &self.path {
            persist(path, &entries).await?;
        }
        Ok(computed)
    }
}

async fn load_entries(path: &Path) -> BTreeMap<String, Vec<f32>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(_) => return BTreeMap::new(),
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Embedding cache {} is corrupt, starting empty: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

async fn persist(path: &Path, entries: &BTreeMap<String, Vec<f32>>) -> Result<()> {
    let bytes = serde_json::to_vec(entries)?;
    write_atomic(path, &bytes).await
}

/// [`Embedder`] that consults an [`EmbeddingCache`] keyed by the text's
/// fingerprint before calling the wrapped embedder.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Arc<EmbeddingCache>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, cache: Arc<EmbeddingCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = fingerprint(text);
        self.cache
            .get_or_compute(&key, || self.inner.embed(text))
            .await
    }
}
