//! Data types for decoded documents, pages, and extracted images.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single page of a decoded document.
///
/// Page numbers are 1-based and unique within a document. The text is
/// mutated exactly once, by the enrichment stage, which appends the page's
/// image-description block; it is immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub page_number: u32,
    /// The page's text content (enriched in place by the enrichment stage).
    pub text: String,
}

/// An image extracted from a document by the decoder.
///
/// Created without a description; the description is filled exactly once by
/// the image description provider during enrichment. Images are owned by
/// the document and referenced from chunks only via page number; their
/// descriptions are merged into page text rather than indexed separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedImage {
    /// Opaque storage reference (file path or URL) for the image bytes.
    pub path: String,
    /// Display name for the image, used in enrichment blocks and citations.
    pub filename: String,
    /// 1-based page the image appeared on.
    pub page_number: u32,
    /// 1-based order of the image within its page.
    pub sequence_index: u32,
    /// Natural-language description, set during enrichment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The output of the document decoder: full markdown, ordered pages, and
/// extracted images in (page, sequence) order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DecodedDocument {
    /// Full-document markdown with `## Page N` section headings.
    pub markdown: String,
    /// Pages in ascending page-number order.
    pub pages: Vec<Page>,
    /// Extracted images, ordered by page then sequence index.
    pub images: Vec<ExtractedImage>,
}

/// A document's identity: user-supplied name plus a content hash of its bytes.
///
/// The `(name, hash)` pairing is the cache and index key, so the same name
/// with different bytes is a new revision, never a silent overwrite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentId {
    /// User-supplied document name.
    pub name: String,
    /// Hex-encoded SHA-256 hash of the document bytes.
    pub content_hash: String,
}

impl DocumentId {
    /// Compute a document identity from its name and raw bytes.
    pub fn new(name: impl Into<String>, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let content_hash = format!("{:x}", hasher.finalize());
        Self { name: name.into(), content_hash }
    }

    /// Reconstruct an identity from a name and an already-computed hash.
    pub fn from_parts(name: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self { name: name.into(), content_hash: content_hash.into() }
    }

    /// The first 12 hex characters of the content hash.
    pub fn short_hash(&self) -> &str {
        &self.content_hash[..self.content_hash.len().min(12)]
    }

    /// Stable string id used for index records and cache keys:
    /// `{name}-{hash12}`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.name, self.short_hash())
    }
}
