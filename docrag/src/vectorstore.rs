//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use docrag_core::Result;

use crate::document::{Chunk, SearchResult};

/// A storage backend for chunk embeddings with similarity search.
///
/// Implementations manage named collections of [`Chunk`]s and support
/// idempotent upserting, document-scoped deletion, and nearest-neighbor
/// search. Upserts key on chunk id, which is content-derived, so re-adding
/// identical chunks never creates duplicates.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs from a collection.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Delete every chunk belonging to one document, leaving other
    /// documents in the collection untouched.
    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<()>;

    /// Number of chunks stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score; ties are
    /// broken by ascending chunk id so retrieval order is deterministic.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
