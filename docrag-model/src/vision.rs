//! Vision-model image description over an OpenAI-compatible chat API.
//!
//! Images are sent inline as base64 data URLs in a multimodal user
//! message: one text part carrying the description prompt and one
//! `image_url` part carrying the encoded image.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error};

use docrag_core::{DocragError, ExtractedImage, ImageDescriber, Result};

use crate::openai::error_detail;

/// Default prompt requesting a detailed description.
const DEFAULT_PROMPT: &str = "Describe this image in detail, including all visible elements, \
     text, charts, diagrams, and their relationships.";

/// Prompt used in brief-caption mode.
const BRIEF_PROMPT: &str = "Describe this image in one sentence.";

/// Default completion token budget for descriptions.
const DEFAULT_MAX_TOKENS: u32 = 512;

/// An [`ImageDescriber`] backed by an OpenAI-compatible vision chat model.
///
/// Resolves each image's storage reference as a local file path, encodes
/// the bytes as a data URL, and asks the model for a description.
pub struct OpenAiImageDescriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    prompt: String,
    max_tokens: u32,
}

impl OpenAiImageDescriber {
    /// Create a new describer with the given API key, base URL, and model.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DocragError::provider("Vision", "API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            prompt: DEFAULT_PROMPT.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Override the description prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Request one-sentence captions instead of detailed descriptions.
    pub fn brief(self) -> Self {
        self.with_prompt(BRIEF_PROMPT)
    }

    /// Guess the mime type from the image filename extension.
    fn mime_type(filename: &str) -> &'static str {
        match filename.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/png",
        }
    }

    /// Build the multimodal user message content for one image.
    fn content_parts(&self, image: &ExtractedImage, bytes: &[u8]) -> Value {
        let data_url =
            format!("data:{};base64,{}", Self::mime_type(&image.filename), BASE64.encode(bytes));
        json!([
            { "type": "text", "text": self.prompt },
            { "type": "image_url", "image_url": { "url": data_url } },
        ])
    }
}

#[derive(Serialize)]
struct VisionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    max_tokens: u32,
    temperature: f32,
}

#[async_trait]
impl ImageDescriber for OpenAiImageDescriber {
    async fn describe(&self, image: &ExtractedImage) -> Result<String> {
        debug!(provider = "Vision", filename = %image.filename, "describing image");

        let bytes = tokio::fs::read(&image.path).await.map_err(|e| {
            DocragError::provider("Vision", format!("failed to read image '{}': {e}", image.path))
        })?;

        let request_body = VisionRequest {
            model: &self.model,
            messages: vec![json!({ "role": "user", "content": self.content_parts(image, &bytes) })],
            max_tokens: self.max_tokens,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Vision", error = %e, "request failed");
                DocragError::provider("Vision", format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = "Vision", %status, "API error");
            return Err(DocragError::provider("Vision", format!("API returned {status}: {detail}")));
        }

        let body: Value = response.json().await.map_err(|e| {
            error!(provider = "Vision", error = %e, "failed to parse response");
            DocragError::provider("Vision", format!("failed to parse response: {e}"))
        })?;

        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| DocragError::provider("Vision", "API returned no description"))
    }
}
