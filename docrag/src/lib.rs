//! # docrag
//!
//! A PDF RAG pipeline: documents are decoded to markdown and pages,
//! extracted images are described by a vision model and merged into the
//! page text, the enriched pages are chunked, embedded, and indexed into a
//! vector store, and queries are answered from the retrieved chunks with
//! page-level citations that carry the cited page's images.
//!
//! The entry point is [`DocumentSession`]:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrag::{DocumentSession, RagConfig};
//!
//! let session = DocumentSession::builder()
//!     .decoder(Arc::new(my_decoder))
//!     .describer(Arc::new(my_vision_provider))
//!     .chat(Arc::new(my_chat_model))
//!     .embedder(Arc::new(my_embedder))
//!     .config(RagConfig::default())
//!     .build()?;
//!
//! let report = session.ingest(&pdf_bytes, "manual").await?;
//! let answer = session.ask("What does figure 3 show?", 5).await?;
//! ```
//!
//! External failures degrade instead of aborting: a failed image
//! description becomes a placeholder, a failed embedding a zero vector,
//! and a failed chat completion an error-string answer. Only decode and
//! vector-index failures propagate to the caller.

pub mod batch;
pub mod chunking;
pub mod config;
pub mod document;
pub mod engine;
pub mod enrich;
pub mod fscache;
pub mod indexer;
pub mod inmemory;
pub mod session;
pub mod vectorstore;

pub use batch::BatchWriter;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Citation, PageImage, PageImageIndex, SearchResult};
pub use engine::{RagAnswer, RagEngine};
pub use enrich::enrich;
pub use fscache::FsDocumentCache;
pub use indexer::{IndexOutcome, Indexer};
pub use inmemory::InMemoryVectorStore;
pub use session::{
    DocumentInfo, DocumentSession, IngestReport, SessionBuilder, SessionStatus,
};
pub use vectorstore::VectorStore;
