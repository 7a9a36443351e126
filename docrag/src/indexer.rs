//! Indexing stage: chunk enriched pages, embed them, and upsert in batches.

use std::sync::Arc;

use tracing::{debug, info, warn};

use docrag_core::{EmbeddingProvider, ExtractedImage, Page, Result};

use crate::batch::BatchWriter;
use crate::chunking::chunk_pages;
use crate::config::RagConfig;
use crate::document::{Chunk, PageImageIndex};
use crate::vectorstore::VectorStore;

/// What an indexing pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Number of chunks written to the vector store.
    pub chunk_count: usize,
    /// Number of chunks whose embedding degraded to a zero vector.
    pub degraded_embeddings: usize,
}

/// Runs the chunk → embed → upsert flow for one document and builds the
/// page→image index used for citations at query time.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: RagConfig,
}

impl Indexer {
    /// Create an indexer over the given embedding provider and store.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, store, config }
    }

    /// Index one document's enriched pages into `collection` under
    /// `document_id`, replacing any chunks that document previously had.
    ///
    /// Embedding failures degrade to zero vectors of the provider's
    /// dimension rather than aborting: degraded chunks stay queryable,
    /// just poorly ranked. Store failures propagate; there is no safe
    /// degraded continuation without an index.
    pub async fn index_document(
        &self,
        collection: &str,
        document_id: &str,
        pages: &[Page],
        images: &[ExtractedImage],
    ) -> Result<(IndexOutcome, PageImageIndex)> {
        let mut chunks =
            chunk_pages(pages, document_id, self.config.chunk_size, self.config.chunk_overlap);

        let degraded_embeddings = self.embed_chunks(&mut chunks).await;

        // Replace the document's previous revision before writing the new
        // chunks. The session holds its write lock across this whole call,
        // so no query observes the gap between delete and upsert.
        self.store.delete_document(collection, document_id).await?;

        let writer = BatchWriter::new(self.config.batch_size);
        writer
            .write_all(&chunks, |batch| {
                let store = Arc::clone(&self.store);
                async move { store.upsert(collection, &batch).await }
            })
            .await?;

        let outcome = IndexOutcome { chunk_count: chunks.len(), degraded_embeddings };
        info!(
            document_id,
            chunk_count = outcome.chunk_count,
            degraded_embeddings,
            "indexed document"
        );

        Ok((outcome, PageImageIndex::from_images(images)))
    }

    /// Attach embeddings to chunks, degrading to zero vectors on provider
    /// failure. Returns the number of degraded chunks.
    async fn embed_chunks(&self, chunks: &mut [Chunk]) -> usize {
        if chunks.is_empty() {
            return 0;
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        match self.embedder.embed_batch(&texts).await {
            Ok(embeddings) if embeddings.len() == chunks.len() => {
                for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                    chunk.embedding = embedding;
                }
                debug!(chunk_count = chunks.len(), "embedded chunk batch");
                0
            }
            Ok(embeddings) => {
                warn!(
                    expected = chunks.len(),
                    got = embeddings.len(),
                    "embedding batch size mismatch, degrading to zero vectors"
                );
                self.degrade_all(chunks)
            }
            Err(e) => {
                warn!(error = %e, "embedding failed, degrading to zero vectors");
                self.degrade_all(chunks)
            }
        }
    }

    fn degrade_all(&self, chunks: &mut [Chunk]) -> usize {
        let dimensions = self.embedder.dimensions();
        for chunk in chunks.iter_mut() {
            chunk.embedding = vec![0.0; dimensions];
        }
        chunks.len()
    }
}
