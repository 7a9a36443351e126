//! Deterministic mock providers for tests and offline development.
//!
//! Every mock is fully deterministic, needs no network, and offers an
//! always-failing variant for exercising the pipeline's degrade paths.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use docrag_core::{
    ChatMessage, ChatModel, DecodedDocument, DocragError, DocumentDecoder, EmbeddingProvider,
    ExtractedImage, ImageDescriber, Result,
};

/// A deterministic embedding provider: each whitespace token hashes into a
/// bucket of the output vector, which is then L2-normalized. Texts sharing
/// tokens get similar embeddings, so retrieval behaves sensibly in tests.
pub struct MockEmbedder {
    dimensions: usize,
    fail: bool,
}

impl MockEmbedder {
    /// Create a mock embedder with the given output dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, fail: false }
    }

    /// A variant whose every call fails with a provider error.
    pub fn failing(dimensions: usize) -> Self {
        Self { dimensions, fail: true }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split_whitespace() {
            let mut hasher = Sha256::new();
            hasher.update(token.to_lowercase().as_bytes());
            let digest = hasher.finalize();
            let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                % self.dimensions;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(DocragError::provider("MockEmbedder", "configured to fail"));
        }
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A chat model that returns a canned answer and records every message
/// sequence it receives, for asserting on prompt construction.
pub struct MockChatModel {
    answer: String,
    fail: bool,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    /// Create a mock returning `answer` for every completion.
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), fail: false, requests: Mutex::new(Vec::new()) }
    }

    /// A variant whose every call fails with a provider error.
    pub fn failing() -> Self {
        Self { answer: String::new(), fail: true, requests: Mutex::new(Vec::new()) }
    }

    /// All message sequences received so far, in call order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().expect("mock lock poisoned").push(messages.to_vec());
        if self.fail {
            return Err(DocragError::provider("MockChatModel", "configured to fail"));
        }
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "mock-chat"
    }
}

/// An image describer producing `A picture of {filename}` descriptions,
/// with optional per-call delay and an always-failing variant.
pub struct MockDescriber {
    fail: bool,
    delay: Option<Duration>,
}

impl MockDescriber {
    /// Create a describer that succeeds for every image.
    pub fn new() -> Self {
        Self { fail: false, delay: None }
    }

    /// A variant whose every call fails with a provider error.
    pub fn failing() -> Self {
        Self { fail: true, delay: None }
    }

    /// Sleep for `delay` before answering, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for MockDescriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageDescriber for MockDescriber {
    async fn describe(&self, image: &ExtractedImage) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(DocragError::provider("MockDescriber", "configured to fail"));
        }
        Ok(format!("A picture of {}", image.filename))
    }
}

/// A decoder returning a scripted [`DecodedDocument`] regardless of input
/// bytes, with passthrough, failure, and plain-text fallback variants.
pub struct MockDecoder {
    document: DecodedDocument,
    passthrough: bool,
    fail: bool,
    plain: Option<DecodedDocument>,
}

impl MockDecoder {
    /// Create a decoder that returns `document` for every input.
    pub fn new(document: DecodedDocument) -> Self {
        Self { document, passthrough: false, fail: false, plain: None }
    }

    /// A decoder that treats the input bytes as UTF-8 text and returns a
    /// single-page document containing them, so tests control page content
    /// through the bytes they ingest.
    pub fn passthrough() -> Self {
        Self {
            document: DecodedDocument::default(),
            passthrough: true,
            fail: false,
            plain: None,
        }
    }

    /// A variant whose `decode` always fails with a decode error.
    pub fn failing() -> Self {
        Self { document: DecodedDocument::default(), passthrough: false, fail: true, plain: None }
    }

    /// Provide a degraded document for the plain-text fallback path.
    pub fn with_plain_fallback(mut self, plain: DecodedDocument) -> Self {
        self.plain = Some(plain);
        self
    }
}

#[async_trait]
impl DocumentDecoder for MockDecoder {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument> {
        if self.fail {
            return Err(DocragError::Decode("mock decoder configured to fail".into()));
        }
        if self.passthrough {
            let text = String::from_utf8_lossy(bytes).into_owned();
            return Ok(DecodedDocument {
                markdown: format!("## Page 1\n\n{text}\n"),
                pages: vec![docrag_core::Page { page_number: 1, text }],
                images: Vec::new(),
            });
        }
        Ok(self.document.clone())
    }

    async fn decode_plain(&self, _bytes: &[u8]) -> Result<DecodedDocument> {
        self.plain
            .clone()
            .ok_or_else(|| DocragError::Decode("no fallback extraction available".into()))
    }
}
