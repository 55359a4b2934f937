use async_trait::async_trait;
use crate::types::{Document, QueryHit};
use crate::Result;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert documents, replacing any existing document with the same id.
    async fn upsert(&self, documents: &[Document]) -> Result<()>;

    /// Semantic top-`limit` query, best match first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>>;

    /// Remove a document by id. Missing ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}
