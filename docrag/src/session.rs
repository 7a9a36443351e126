//! Session context: the exposed surface of the pipeline.
//!
//! A [`DocumentSession`] owns the providers, the vector store, the page→
//! image indices, and the conversation history for one consumer. There is
//! no process-wide state: creating a session is the only setup, dropping
//! it the only teardown.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use docrag_core::{
    CachedDocument, ChatMessage, ChatModel, DecodedDocument, DocragError, DocumentCache,
    DocumentDecoder, DocumentId, EmbeddingProvider, ExtractedImage, ImageDescriber, Result,
    degraded_description,
};

use crate::config::RagConfig;
use crate::document::PageImageIndex;
use crate::engine::{RagAnswer, RagEngine};
use crate::enrich::enrich;
use crate::indexer::Indexer;
use crate::vectorstore::VectorStore;

/// Default collection name for a session's vector store.
const DEFAULT_COLLECTION: &str = "documents";

/// What one ingestion produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of pages in the decoded document.
    pub page_count: usize,
    /// Number of images extracted from the document.
    pub image_count: usize,
    /// Number of chunks written to the vector store.
    pub chunk_count: usize,
    /// Images whose description degraded to a placeholder.
    pub degraded_images: usize,
    /// Chunks whose embedding degraded to a zero vector.
    pub degraded_embeddings: usize,
    /// True when the same `(name, content hash)` was already indexed and
    /// ingestion short-circuited to a lookup.
    pub already_indexed: bool,
}

/// A snapshot of the session's readiness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatus {
    /// True when at least one document is indexed and queryable.
    pub is_ready: bool,
    /// The most recently ingested document's name, if any.
    pub active_document_name: Option<String>,
    /// Total chunks indexed across all documents in the session.
    pub chunk_count: usize,
}

/// Summary of one ingested document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentInfo {
    /// User-supplied document name.
    pub name: String,
    /// Pages in the decoded document.
    pub page_count: usize,
    /// Images extracted from the document.
    pub image_count: usize,
    /// Chunks indexed for the document.
    pub chunk_count: usize,
}

/// Per-document bookkeeping inside the session.
struct DocumentEntry {
    document_id: DocumentId,
    images: PageImageIndex,
    page_count: usize,
    image_count: usize,
    chunk_count: usize,
}

#[derive(Default)]
struct SessionState {
    /// Ingested documents by name. A name maps to its latest revision.
    documents: HashMap<String, DocumentEntry>,
    /// Name of the most recently ingested document.
    active: Option<String>,
    /// Conversation history for [`DocumentSession::ask`].
    history: Vec<ChatMessage>,
}

/// One consumer's document session: ingest documents, ask questions,
/// inspect status, and reset.
///
/// Ingestion does its slow provider work (decode, describe, cache) before
/// touching session state; the write lock covers only the delete-then-
/// reindex of the vector index and the state update. Readers see either
/// the previous revision or the new one, never a gap, and never wait on
/// an external provider call.
pub struct DocumentSession {
    decoder: Arc<dyn DocumentDecoder>,
    describer: Arc<dyn ImageDescriber>,
    cache: Option<Arc<dyn DocumentCache>>,
    store: Arc<dyn VectorStore>,
    engine: RagEngine,
    indexer: Indexer,
    config: RagConfig,
    collection: String,
    state: RwLock<SessionState>,
}

impl DocumentSession {
    /// Create a new [`SessionBuilder`].
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Ingest a document: decode (or load from cache), describe images,
    /// enrich, chunk, embed, and index.
    ///
    /// Re-ingesting the same `(name, bytes)` short-circuits to a lookup.
    /// The same name with different bytes is a new revision; the previous
    /// revision's chunks are replaced before the session accepts queries
    /// again. Provider failures degrade (placeholder descriptions, zero
    /// embeddings) and are counted in the report; decode and index
    /// failures propagate.
    pub async fn ingest(&self, bytes: &[u8], name: &str) -> Result<IngestReport> {
        let document_id = DocumentId::new(name, bytes);

        if let Some(report) = self.lookup_indexed(name, &document_id).await {
            return Ok(report);
        }

        self.ensure_collection().await?;

        // Decode, describe, enrich, and cache before taking the session
        // lock: these are the slow external calls, and queries against
        // already-indexed documents must not wait behind them.
        let (cached, degraded_images) = match self.load_cached(&document_id).await {
            Some(cached) => {
                let degraded = cached
                    .images
                    .iter()
                    .filter(|image| {
                        image
                            .description
                            .as_deref()
                            .is_some_and(|d| d.starts_with("[Image from document - error:"))
                    })
                    .count();
                (cached, degraded)
            }
            None => self.decode_and_enrich(&document_id, bytes).await?,
        };

        // Write lock held across the index replacement and the state
        // update, so the delete-then-reindex of a revision is atomic to
        // readers.
        let mut state = self.state.write().await;

        if let Some(entry) = state.documents.get(name) {
            if entry.document_id == document_id {
                // A concurrent ingestion of the same revision finished first.
                info!(name, "document already indexed, skipping ingestion");
                return Ok(Self::already_indexed_report(entry));
            }
            // A previous revision under this name owns different chunk ids;
            // drop them before indexing the new revision.
            self.store.delete_document(&self.collection, &entry.document_id.id()).await?;
        }

        let (outcome, image_index) = self
            .indexer
            .index_document(&self.collection, &document_id.id(), &cached.pages, &cached.images)
            .await?;

        let report = IngestReport {
            page_count: cached.pages.len(),
            image_count: cached.images.len(),
            chunk_count: outcome.chunk_count,
            degraded_images,
            degraded_embeddings: outcome.degraded_embeddings,
            already_indexed: false,
        };

        state.documents.insert(
            name.to_string(),
            DocumentEntry {
                document_id,
                images: image_index,
                page_count: report.page_count,
                image_count: report.image_count,
                chunk_count: report.chunk_count,
            },
        );
        state.active = Some(name.to_string());

        info!(
            name,
            pages = report.page_count,
            images = report.image_count,
            chunks = report.chunk_count,
            degraded_images = report.degraded_images,
            "document ingested"
        );
        Ok(report)
    }

    /// Answer a query using the session's own conversation history, and
    /// record the exchange in it. A `k` of zero selects the configured
    /// [`RagConfig::top_k`].
    pub async fn ask(&self, query: &str, k: usize) -> Result<RagAnswer> {
        let history = {
            let state = self.state.read().await;
            state.history.clone()
        };
        let answer = self.answer(query, &history, k).await?;

        let mut state = self.state.write().await;
        state.history.push(ChatMessage::user(query));
        state.history.push(ChatMessage::assistant(answer.answer.clone()));
        Ok(answer)
    }

    /// Answer a query with an explicit history, leaving session state
    /// untouched.
    pub async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
        k: usize,
    ) -> Result<RagAnswer> {
        let (images, indexed) = {
            let state = self.state.read().await;
            let images: HashMap<String, PageImageIndex> = state
                .documents
                .values()
                .map(|entry| (entry.document_id.id(), entry.images.clone()))
                .collect();
            (images, !state.documents.is_empty())
        };

        if !indexed {
            return Ok(RagAnswer {
                answer: "No document has been ingested yet.".to_string(),
                citations: Vec::new(),
                model_used: self.engine_model().to_string(),
            });
        }

        self.engine.answer(&self.collection, query, history, k, &images).await
    }

    /// Current readiness, active document, and total chunk count.
    pub async fn status(&self) -> SessionStatus {
        let state = self.state.read().await;
        let chunk_count = state.documents.values().map(|entry| entry.chunk_count).sum();
        SessionStatus {
            is_ready: chunk_count > 0,
            active_document_name: state.active.clone(),
            chunk_count,
        }
    }

    /// Summaries of all ingested documents, sorted by name.
    pub async fn documents(&self) -> Vec<DocumentInfo> {
        let state = self.state.read().await;
        let mut infos: Vec<DocumentInfo> = state
            .documents
            .iter()
            .map(|(name, entry)| DocumentInfo {
                name: name.clone(),
                page_count: entry.page_count,
                image_count: entry.image_count,
                chunk_count: entry.chunk_count,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Clear index state for the active document only. Other ingested
    /// documents stay queryable.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(name) = state.active.take() else {
            return Ok(());
        };
        if let Some(entry) = state.documents.remove(&name) {
            self.store.delete_document(&self.collection, &entry.document_id.id()).await?;
            info!(name, "active document reset");
        }
        Ok(())
    }

    /// Clear the conversation history only; indexed documents are kept.
    pub async fn clear_history(&self) {
        let mut state = self.state.write().await;
        state.history.clear();
    }

    fn engine_model(&self) -> &str {
        self.engine.model_name()
    }

    /// Fast-path check for an already-indexed `(name, hash)` pair.
    async fn lookup_indexed(&self, name: &str, document_id: &DocumentId) -> Option<IngestReport> {
        let state = self.state.read().await;
        let entry = state.documents.get(name)?;
        if entry.document_id != *document_id {
            return None;
        }
        info!(name, "document already indexed, skipping ingestion");
        Some(Self::already_indexed_report(entry))
    }

    fn already_indexed_report(entry: &DocumentEntry) -> IngestReport {
        IngestReport {
            page_count: entry.page_count,
            image_count: entry.image_count,
            chunk_count: entry.chunk_count,
            degraded_images: 0,
            degraded_embeddings: 0,
            already_indexed: true,
        }
    }

    async fn ensure_collection(&self) -> Result<()> {
        self.store.create_collection(&self.collection, self.indexer_dimensions()).await
    }

    fn indexer_dimensions(&self) -> usize {
        self.engine.embedder_dimensions()
    }

    /// Cache lookup; cache failures are absorbed and logged so ingestion
    /// proceeds without caching.
    async fn load_cached(&self, id: &DocumentId) -> Option<CachedDocument> {
        let cache = self.cache.as_ref()?;
        match cache.get(id).await {
            Ok(Some(cached)) => {
                info!(name = %id.name, "loaded document from cache");
                Some(cached)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cache read failed, re-decoding");
                None
            }
        }
    }

    /// Decode, describe, and enrich a document, then cache the result.
    /// Returns the enriched representation and the degraded-image count.
    async fn decode_and_enrich(
        &self,
        id: &DocumentId,
        bytes: &[u8],
    ) -> Result<(CachedDocument, usize)> {
        let decoded = match self.decoder.decode(bytes).await {
            Ok(decoded) => decoded,
            Err(DocragError::Decode(reason)) => {
                warn!(reason, "decode failed, falling back to plain-text extraction");
                self.decoder.decode_plain(bytes).await?
            }
            Err(e) => return Err(e),
        };

        let DecodedDocument { markdown, pages, images } = decoded;
        let (described, degraded_images) = self.describe_images(images).await;
        let (pages, markdown) = enrich(pages, markdown, &described);

        let cached =
            CachedDocument { document_id: id.clone(), markdown, pages, images: described };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&cached).await {
                warn!(error = %e, "cache write failed, continuing without caching");
            }
        }

        Ok((cached, degraded_images))
    }

    /// Describe images one at a time in (page, sequence) order, each call
    /// bounded by the configured timeout. Failures and timeouts degrade to
    /// the placeholder description. Returns the described images and the
    /// degraded count.
    async fn describe_images(
        &self,
        mut images: Vec<ExtractedImage>,
    ) -> (Vec<ExtractedImage>, usize) {
        images.sort_by_key(|image| (image.page_number, image.sequence_index));

        let mut degraded = 0;
        for image in &mut images {
            let description =
                match tokio::time::timeout(self.config.describe_timeout, self.describer.describe(image))
                    .await
                {
                    Ok(Ok(description)) => description,
                    Ok(Err(e)) => {
                        warn!(filename = %image.filename, error = %e, "image description failed");
                        degraded += 1;
                        degraded_description(&e.to_string())
                    }
                    Err(_) => {
                        warn!(filename = %image.filename, "image description timed out");
                        degraded += 1;
                        degraded_description("request timed out")
                    }
                };
            image.description = Some(description);
        }
        (images, degraded)
    }
}

/// Builder for constructing a [`DocumentSession`].
///
/// Decoder, describer, chat model, and embedding provider are required;
/// the store defaults to [`InMemoryVectorStore`](crate::InMemoryVectorStore)
/// and the cache is optional.
#[derive(Default)]
pub struct SessionBuilder {
    decoder: Option<Arc<dyn DocumentDecoder>>,
    describer: Option<Arc<dyn ImageDescriber>>,
    chat: Option<Arc<dyn ChatModel>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    cache: Option<Arc<dyn DocumentCache>>,
    config: Option<RagConfig>,
    collection: Option<String>,
}

impl SessionBuilder {
    /// Set the document decoder.
    pub fn decoder(mut self, decoder: Arc<dyn DocumentDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Set the image description provider.
    pub fn describer(mut self, describer: Arc<dyn ImageDescriber>) -> Self {
        self.describer = Some(describer);
        self
    }

    /// Set the chat completion model.
    pub fn chat(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Set the embedding provider (shared by ingestion and queries).
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend. Defaults to the in-memory store.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set an optional document cache.
    pub fn cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the pipeline configuration. Defaults to [`RagConfig::default`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the vector store collection name. Defaults to `documents`.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Build the [`DocumentSession`], validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`DocragError::Config`] if a required provider is missing.
    pub fn build(self) -> Result<DocumentSession> {
        let decoder =
            self.decoder.ok_or_else(|| DocragError::Config("decoder is required".to_string()))?;
        let describer = self
            .describer
            .ok_or_else(|| DocragError::Config("describer is required".to_string()))?;
        let chat =
            self.chat.ok_or_else(|| DocragError::Config("chat model is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| DocragError::Config("embedding provider is required".to_string()))?;

        let store =
            self.store.unwrap_or_else(|| Arc::new(crate::inmemory::InMemoryVectorStore::new()));
        let config = self.config.unwrap_or_default();
        let collection = self.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let indexer = Indexer::new(Arc::clone(&embedder), Arc::clone(&store), config.clone());
        let engine = RagEngine::new(embedder, Arc::clone(&store), chat, config.clone());

        Ok(DocumentSession {
            decoder,
            describer,
            cache: self.cache,
            store,
            engine,
            indexer,
            config,
            collection,
            state: RwLock::new(SessionState::default()),
        })
    }
}
