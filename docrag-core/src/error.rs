//! Error types shared across the docrag crates.

use thiserror::Error;

/// Errors that can occur in the document RAG pipeline.
///
/// The variants mirror the failure boundaries of the system: decoding a
/// document, calling an external model provider, talking to the vector
/// index, and reading or writing the document cache. Provider and cache
/// failures are recoverable: the pipeline degrades to placeholder content
/// instead of aborting. Decode and index failures propagate to the caller.
#[derive(Debug, Error)]
pub enum DocragError {
    /// The document bytes could not be decoded (malformed or unsupported PDF).
    #[error("Decode error: {0}")]
    Decode(String),

    /// An external model or API call failed (network, auth, rate limit).
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index backend failed or is unavailable.
    #[error("Index error ({backend}): {message}")]
    Index {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A document cache read or write failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DocragError {
    /// Shorthand for a [`DocragError::Provider`] with the given provider name.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { provider: provider.into(), message: message.into() }
    }

    /// Shorthand for a [`DocragError::Index`] with the given backend name.
    pub fn index(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Index { backend: backend.into(), message: message.into() }
    }
}

/// A convenience result type for docrag operations.
pub type Result<T> = std::result::Result<T, DocragError>;
