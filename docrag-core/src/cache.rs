//! Document cache trait: persists decoded and enriched documents by content hash.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, ExtractedImage, Page};
use crate::error::Result;

/// The enriched representation of a document as persisted by the cache.
///
/// Pages and images are stored post-enrichment (image blocks merged into
/// page text, descriptions filled in), so a cache hit skips decoding and
/// image description entirely; only chunking and indexing re-run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedDocument {
    /// The document's identity at the time it was cached.
    pub document_id: DocumentId,
    /// Enriched full-document markdown.
    pub markdown: String,
    /// Enriched pages in ascending page-number order.
    pub pages: Vec<Page>,
    /// Described images, ordered by page then sequence index.
    pub images: Vec<ExtractedImage>,
}

/// A one-line summary of a cached document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSummary {
    /// User-supplied document name.
    pub name: String,
    /// Number of pages in the cached representation.
    pub page_count: usize,
    /// Number of described images in the cached representation.
    pub image_count: usize,
}

/// Key/value persistence for decoded+enriched documents.
///
/// Keyed by `(name, content_hash)`, so re-uploading identical bytes under
/// the same name is a hit while changed bytes miss and re-decode. Cache
/// failures are recoverable: the ingestion pipeline logs them and proceeds
/// without caching.
#[async_trait]
pub trait DocumentCache: Send + Sync {
    /// Look up the cached representation for a document identity.
    async fn get(&self, id: &DocumentId) -> Result<Option<CachedDocument>>;

    /// Persist the enriched representation for a document identity.
    async fn put(&self, document: &CachedDocument) -> Result<()>;

    /// Remove all cached documents.
    async fn clear(&self) -> Result<()>;

    /// Summaries of all cached documents.
    async fn list(&self) -> Result<Vec<CacheSummary>>;
}
