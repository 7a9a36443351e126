//! # docrag-core
//!
//! Shared vocabulary for the docrag PDF RAG pipeline: the document data
//! model, the error taxonomy, and the provider traits the pipeline consumes.
//!
//! The pipeline treats every external capability (document decoding,
//! image description, chat completion, embedding, cache persistence)
//! as a trait defined here. `docrag` orchestrates them; `docrag-model`
//! provides HTTP-backed and mock implementations.

pub mod cache;
pub mod chat;
pub mod decoder;
pub mod describe;
pub mod document;
pub mod embedding;
pub mod error;

pub use cache::{CacheSummary, CachedDocument, DocumentCache};
pub use chat::{ChatMessage, ChatModel, Role};
pub use decoder::DocumentDecoder;
pub use describe::{ImageDescriber, degraded_description};
pub use document::{DecodedDocument, DocumentId, ExtractedImage, Page};
pub use embedding::EmbeddingProvider;
pub use error::{DocragError, Result};
