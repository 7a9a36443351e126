//! Retrieval-side data types: chunks, search results, and citations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use docrag_core::ExtractedImage;

/// A bounded contiguous slice of one page's enriched text, with its vector
/// embedding. The unit of retrieval.
///
/// A chunk never spans pages. Its id is a deterministic function of
/// `(document_id, page_number, sequence_index, content hash)`, so
/// re-ingesting identical content yields identical ids and upserts are
/// idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Content-derived unique identifier.
    pub id: String,
    /// The chunk's text (a contiguous slice of one page's enriched text).
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until the indexing
    /// stage attaches it; a zero vector if embedding degraded.
    pub embedding: Vec<f32>,
    /// 1-based page the chunk was sliced from.
    pub page_number: u32,
    /// 0-based order of the chunk within its page.
    pub sequence_index: u32,
    /// The id of the owning document (`DocumentId::id()`).
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A structured reference returned alongside an answer: the cited page, a
/// leading snippet of the supporting chunk, and the images on that page.
///
/// Citations are derived fresh per query from a search result plus the
/// page→image index; they are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// 1-based rank of the supporting source in the retrieved context.
    pub source_rank: u32,
    /// The cited page number.
    pub page_number: u32,
    /// Leading snippet of the chunk text, truncated with an ellipsis.
    pub text_snippet: String,
    /// Storage references of the page's images, in extraction order.
    pub image_paths: Vec<String>,
    /// Whether the cited page has any images.
    pub has_images: bool,
}

/// An image reference held in the page→image index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageImage {
    /// Opaque storage reference for the image.
    pub path: String,
    /// Display name for the image.
    pub filename: String,
    /// Natural-language description merged into the page text.
    pub description: String,
}

/// In-memory lookup from page number to that page's images, used at query
/// time to attach images to citations. Built during indexing; images keep
/// extraction order (ascending sequence index) within a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageImageIndex {
    pages: HashMap<u32, Vec<PageImage>>,
}

impl PageImageIndex {
    /// Build the index from described images. Images are grouped by page;
    /// insertion order within a page follows the input ordering, which the
    /// pipeline guarantees is ascending `(page, sequence_index)`.
    pub fn from_images(images: &[ExtractedImage]) -> Self {
        let mut pages: HashMap<u32, Vec<PageImage>> = HashMap::new();
        for image in images {
            pages.entry(image.page_number).or_default().push(PageImage {
                path: image.path.clone(),
                filename: image.filename.clone(),
                description: image.description.clone().unwrap_or_default(),
            });
        }
        Self { pages }
    }

    /// All images on the given page, in extraction order.
    pub fn images_for_page(&self, page_number: u32) -> &[PageImage] {
        self.pages.get(&page_number).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of indexed images.
    pub fn image_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }
}
