use async_trait::async_trait;
use chromadb::v1::{
    client::{ChromaClient, ChromaClientOptions},
    collection::{ChromaCollection, CollectionEntries, QueryOptions},
};
use nc_core::{Document, DocumentMetadata, DocumentStore, Embedder, Error, QueryHit, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::BackendConfig;

pub struct ChromaStorage {
    client: ChromaClient,
    config: BackendConfig,
    embedder: Arc<dyn Embedder>,
}

impl ChromaStorage {
    pub fn new(config: BackendConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let client = ChromaClient::new(ChromaClientOptions {
            url: config.url.clone(),
            ..Default::default()
        });
        debug!("Using ChromaDB collection {} at {}", config.collection, config.url);
        Ok(Self {
            client,
            config,
            embedder,
        })
    }

    fn collection(&self) -> Result<ChromaCollection> {
        self.client
            .get_or_create_collection(&self.config.collection, None)
            .map_err(Error::External)
    }
}

fn to_metadata(document: &Document) -> Map<String, Value> {
    Map::from_iter(vec![
        ("title".to_string(), Value::String(document.metadata.title.clone())),
        ("link".to_string(), Value::String(document.metadata.link.clone())),
        ("source".to_string(), Value::String(document.metadata.source.clone())),
    ])
}

/// Pair a result's metadata with its stored document text. Hits missing
/// either the text or a link are dropped.
fn to_hit(metadata: &Map<String, Value>, text: Option<String>) -> Option<QueryHit> {
    let field = |key: &str| metadata.get(key).and_then(|v| v.as_str()).map(str::to_string);
    Some(QueryHit {
        text: text?,
        metadata: DocumentMetadata {
            title: field("title").unwrap_or_default(),
            link: field("link")?,
            source: field("source").unwrap_or_default(),
        },
        embedding: None,
    })
}

#[async_trait]
impl DocumentStore for ChromaStorage {
    async fn upsert(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut embeddings = Vec::with_capacity(documents.len());
        for document in documents {
            embeddings.push(self.embedder.embed(&document.text).await?);
        }

        let collection = self.collection()?;
        let entries = CollectionEntries {
            ids: documents.iter().map(|d| d.id.as_str()).collect(),
            embeddings: Some(embeddings),
            metadatas: Some(documents.iter().map(to_metadata).collect()),
            documents: Some(documents.iter().map(|d| d.text.as_str()).collect()),
        };
        collection
            .upsert(entries, None)
            .map_err(|e| Error::Storage(format!("Failed to upsert documents: {}", e)))?;
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>> {
        let embedding = self.embedder.embed(text).await?;
        let collection = self.collection()?;

        let query_options = QueryOptions {
            query_embeddings: Some(vec![embedding]),
            query_texts: None,
            n_results: Some(limit),
            where_document: None,
            where_metadata: None,
            include: Some(vec!["metadatas", "documents"]),
        };

        let results = collection
            .query(query_options, None)
            .map_err(|e| Error::Storage(format!("Failed to query documents: {}", e)))?;

        // One query embedding, so only the first result row is populated.
        let metadatas = results
            .metadatas
            .and_then(|rows| rows.into_iter().next().flatten())
            .unwrap_or_default();
        let mut documents = results
            .documents
            .and_then(|rows| rows.into_iter().next().flatten())
            .unwrap_or_default()
            .into_iter();

        let mut hits = Vec::new();
        for metadata in metadatas {
            let text = documents.next().flatten();
            if let Some(hit) = metadata.and_then(|m| to_hit(&m, text)) {
                hits.push(hit);
            }
        }
        Ok(hits)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let collection = self.collection()?;
        collection
            .delete(Some(vec![id]), None, None)
            .map_err(|e| Error::Storage(format!("Failed to delete document: {}", e)))?;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let collection = self.collection()?;
        collection
            .count()
            .map_err(|e| Error::Storage(format!("Failed to count documents: {}", e)))
    }
}
