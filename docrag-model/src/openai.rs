//! OpenAI-compatible chat completion client.
//!
//! Works against any `/chat/completions`-shaped endpoint: OpenAI itself,
//! the HuggingFace router, Ollama, vLLM, and other compatible servers.
//! Set the base URL accordingly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use docrag_core::{ChatMessage, ChatModel, DocragError, Result};

/// The default OpenAI chat completions base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default sampling temperature for grounded answering.
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default completion token budget.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A [`ChatModel`] backed by an OpenAI-compatible chat completions API.
///
/// # Configuration
///
/// - `model` – required model identifier (e.g. `Qwen/Qwen2.5-7B-Instruct`).
/// - `base_url` – defaults to the OpenAI endpoint; override for
///   compatible servers.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment
///   variable.
/// - `temperature` / `max_tokens` – default to 0.3 and 1024.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatModel {
    /// Create a new client with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DocragError::provider("OpenAI", "API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Create a client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            DocragError::provider("OpenAI", "OPENAI_API_KEY environment variable not set")
        })?;
        Self::new(api_key, model)
    }

    /// Point the client at an OpenAI-compatible base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorDetail,
}

#[derive(Deserialize)]
pub(crate) struct ErrorDetail {
    pub(crate) message: String,
}

/// Extract a readable message from an API error body, falling back to the
/// raw body when it is not the standard error shape.
pub(crate) fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(provider = "OpenAI", model = %self.model, messages = messages.len(), "chat completion");

        let request_body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                DocragError::provider("OpenAI", format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = "OpenAI", %status, "API error");
            return Err(DocragError::provider("OpenAI", format!("API returned {status}: {detail}")));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            DocragError::provider("OpenAI", format!("failed to parse response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DocragError::provider("OpenAI", "API returned no choices"))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
