use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use nc_core::{DocumentStore, Embedder, Error, Result, Settings};

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Chroma,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "chroma" => Ok(Self::Chroma),
            other => Err(Error::Config(format!(
                "unknown storage backend: {} (expected memory or chroma)",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Chroma => write!(f, "chroma"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub collection: String,
    /// Snapshot file for the memory backend. `None` keeps everything in RAM.
    pub snapshot: Option<PathBuf>,
}

impl BackendConfig {
    pub fn new(url: String, collection: String) -> Self {
        Self {
            url,
            collection,
            snapshot: None,
        }
    }

    pub fn from_settings(kind: StorageKind, settings: &Settings) -> Self {
        match kind {
            StorageKind::Memory => Self {
                url: "memory://".to_string(),
                collection: settings.collection.clone(),
                snapshot: Some(settings.data_dir.join("store.json")),
            },
            StorageKind::Chroma => {
                Self::new(settings.chroma_url.clone(), settings.collection.clone())
            }
        }
    }

    pub fn with_url(&mut self, url: &str) -> &mut Self {
        self.url = url.to_string();
        self
    }
}

/// Build the document store named by `kind`. Every backend embeds documents
/// and queries through `embedder`.
pub async fn create_storage(
    kind: StorageKind,
    config: BackendConfig,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn DocumentStore>> {
    match kind {
        StorageKind::Memory => {
            let storage = match config.snapshot {
                Some(path) => MemoryStorage::open(path, embedder).await?,
                None => MemoryStorage::new(embedder),
            };
            Ok(Arc::new(storage))
        }
        #[cfg(feature = "chroma")]
        StorageKind::Chroma => Ok(Arc::new(ChromaStorage::new(config, embedder)?)),
        #[cfg(not(feature = "chroma"))]
        StorageKind::Chroma => Err(Error::Config(
            "chroma support is not compiled in (enable the `chroma` feature)".to_string(),
        )),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, BackendConfig, StorageKind};
}
