//! # docrag-model
//!
//! Provider implementations for the docrag pipeline:
//!
//! - [`OpenAiChatModel`] – chat completions against any OpenAI-compatible
//!   endpoint (OpenAI, the HuggingFace router, Ollama, vLLM, …)
//! - [`OpenAiImageDescriber`] – vision-model image description via
//!   base64 data URLs
//! - [`OpenAiEmbeddingProvider`] – embeddings via the `/v1/embeddings` API
//! - [`mock`] – deterministic offline providers for tests
//!
//! All providers implement the traits from `docrag-core` and surface
//! failures as `DocragError::Provider`, which the pipeline absorbs into
//! degraded content rather than aborting.

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod vision;

pub use embedding::OpenAiEmbeddingProvider;
pub use mock::{MockChatModel, MockDecoder, MockDescriber, MockEmbedder};
pub use openai::OpenAiChatModel;
pub use vision::OpenAiImageDescriber;
