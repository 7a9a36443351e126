//! Document decoder trait: PDF bytes in, structured pages and images out.

use async_trait::async_trait;

use crate::document::DecodedDocument;
use crate::error::{DocragError, Result};

/// Turns raw document bytes into markdown, ordered pages, and extracted images.
///
/// The decoder is an external collaborator; docrag only consumes this
/// contract. [`decode`](DocumentDecoder::decode) must fail with
/// [`DocragError::Decode`] on malformed input. When it does, the ingestion
/// pipeline attempts [`decode_plain`](DocumentDecoder::decode_plain), a
/// degraded plain-text-per-page extraction, before reporting the failure to
/// the caller.
#[async_trait]
pub trait DocumentDecoder: Send + Sync {
    /// Decode document bytes into markdown, pages, and images.
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument>;

    /// Degraded fallback extraction: plain text per page, no images.
    ///
    /// The default implementation has no fallback and returns
    /// [`DocragError::Decode`], so decoders without one still surface a
    /// decode failure to the caller.
    async fn decode_plain(&self, _bytes: &[u8]) -> Result<DecodedDocument> {
        Err(DocragError::Decode("no fallback extraction available".into()))
    }
}
