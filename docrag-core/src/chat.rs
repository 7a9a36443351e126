//! Chat completion provider trait and message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The role of a chat message author.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction.
    System,
    /// End-user message.
    User,
    /// Model response.
    Assistant,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A provider that turns a message sequence into a natural-language answer.
///
/// Implementations wrap a specific chat backend behind a single-shot
/// completion call. The RAG engine issues exactly one round-trip per query
/// and converts any failure into a degraded answer string, so providers
/// should surface failures as [`DocragError::Provider`](crate::DocragError::Provider)
/// rather than retrying internally.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the given message sequence.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// The model identifier reported in answers (e.g. `Qwen/Qwen2.5-7B-Instruct`).
    fn name(&self) -> &str;
}
