//! Configuration for the RAG pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use docrag_core::{DocragError, Result};

/// Configuration parameters for ingestion and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Target chunk size in characters (tokens accumulate until this is reached).
    pub chunk_size: usize,
    /// Overlap budget in characters; the token carry-over between chunks is
    /// proportional: `floor(token_count * chunk_overlap / chunk_size)`.
    pub chunk_overlap: usize,
    /// Number of top results to retrieve when a query passes a `k` of zero.
    pub top_k: usize,
    /// Number of records per vector-store write batch.
    pub batch_size: usize,
    /// Maximum citation snippet length in characters.
    pub snippet_len: usize,
    /// Number of past question/answer exchanges carried into the prompt.
    pub history_exchanges: usize,
    /// Deadline for a single image-description call. On expiry the image
    /// gets a placeholder description and ingestion continues.
    #[serde(with = "duration_secs")]
    pub describe_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 5,
            batch_size: 100,
            snippet_len: 150,
            history_exchanges: 3,
            describe_timeout: Duration::from_secs(60),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the target chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap budget in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to retrieve per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the vector-store write batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the maximum citation snippet length.
    pub fn snippet_len(mut self, len: usize) -> Self {
        self.config.snippet_len = len;
        self
    }

    /// Set the number of past exchanges carried into the prompt.
    pub fn history_exchanges(mut self, exchanges: usize) -> Self {
        self.config.history_exchanges = exchanges;
        self
    }

    /// Set the per-image description deadline.
    pub fn describe_timeout(mut self, timeout: Duration) -> Self {
        self.config.describe_timeout = timeout;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DocragError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `batch_size == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(DocragError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(DocragError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(DocragError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.batch_size == 0 {
            return Err(DocragError::Config("batch_size must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
