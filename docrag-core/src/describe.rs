//! Image description provider trait.

use async_trait::async_trait;

use crate::document::ExtractedImage;
use crate::error::Result;

/// Placeholder description used when a describe call fails or times out.
///
/// The pipeline formats the provider error into the braces, e.g.
/// `[Image from document - error: request timed out]`.
pub fn degraded_description(reason: &str) -> String {
    format!("[Image from document - error: {reason}]")
}

/// Turns one extracted image into a natural-language description.
///
/// Implementations resolve the image's storage reference
/// ([`ExtractedImage::path`]) themselves; the pipeline never touches image
/// bytes. Failures surface as
/// [`DocragError::Provider`](crate::DocragError::Provider) and are absorbed
/// by the pipeline, which substitutes [`degraded_description`] and
/// continues; a failing vision backend never aborts an ingestion.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Describe a single image.
    async fn describe(&self, image: &ExtractedImage) -> Result<String>;
}
