//! Retrieval and answer composition: the RAG engine.
//!
//! Given a query and optional conversation history, the engine embeds the
//! query, retrieves the top-K chunks, assembles a grounded prompt, invokes
//! the chat model once, and returns the answer with page-level citations.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use docrag_core::{ChatMessage, ChatModel, EmbeddingProvider, Result, Role};

use crate::config::RagConfig;
use crate::document::{Citation, PageImageIndex, SearchResult};
use crate::vectorstore::VectorStore;

/// System instruction sent with every query. Its clauses are the
/// correctness contract between the engine and the chat model, not a
/// style hint.
const SYSTEM_PROMPT: &str = "You are a helpful AI assistant answering questions based on the provided document context.

Instructions:
- Answer the question based ONLY on the provided context
- If the answer is not in the context, say so clearly
- Be concise and accurate
- Reference specific page numbers when relevant
- If images are mentioned in the context, acknowledge them in your answer";

/// Answer returned when retrieval finds nothing to ground on.
const NO_CONTEXT_ANSWER: &str =
    "No information about this is available in the indexed document.";

/// A grounded answer with its supporting citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// The model's answer, or a descriptive error string if the chat
    /// provider failed.
    pub answer: String,
    /// Citations for the retrieved context, in rank order. Empty when the
    /// provider failed or nothing was retrieved.
    pub citations: Vec<Citation>,
    /// The chat model that produced (or failed to produce) the answer.
    pub model_used: String,
}

/// The retrieval and answer-composition stage.
pub struct RagEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
    config: RagConfig,
}

impl RagEngine {
    /// Create an engine over the given providers and store. The embedding
    /// provider must be the same one used at ingestion so both sides of
    /// the similarity search share an embedding space.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, store, chat, config }
    }

    /// The chat model identifier reported in answers.
    pub fn model_name(&self) -> &str {
        self.chat.name()
    }

    /// Dimensionality of the shared embedding provider.
    pub fn embedder_dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Answer a query against `collection`, carrying at most the last
    /// [`RagConfig::history_exchanges`] question/answer exchanges of
    /// `history` into the prompt. A `k` of zero selects the configured
    /// [`RagConfig::top_k`]. `images` maps document id to that
    /// document's page→image index for citation lookup.
    ///
    /// Chat provider failures never surface as errors: they produce a
    /// well-formed [`RagAnswer`] whose answer describes the failure, with
    /// empty citations. Only vector-index failures return `Err`.
    pub async fn answer(
        &self,
        collection: &str,
        query: &str,
        history: &[ChatMessage],
        k: usize,
        images: &HashMap<String, PageImageIndex>,
    ) -> Result<RagAnswer> {
        let k = if k == 0 { self.config.top_k } else { k };
        let results = self.retrieve(collection, query, k).await?;
        if results.is_empty() {
            info!(query_len = query.len(), "no context retrieved");
            return Ok(RagAnswer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                citations: Vec::new(),
                model_used: self.chat.name().to_string(),
            });
        }

        let (context, citations) = self.format_context(&results, images);
        let messages = self.build_messages(query, history, &context);

        match self.chat.complete(&messages).await {
            Ok(answer) => {
                info!(citations = citations.len(), "answer generated");
                Ok(RagAnswer { answer, citations, model_used: self.chat.name().to_string() })
            }
            Err(e) => {
                error!(error = %e, "chat completion failed");
                Ok(RagAnswer {
                    answer: format!("Error generating response: {e}"),
                    citations: Vec::new(),
                    model_used: self.chat.name().to_string(),
                })
            }
        }
    }

    /// Embed the query and run the nearest-neighbor search. A failed query
    /// embedding degrades to a zero vector of the provider's dimension, so
    /// retrieval still runs, just with meaningless ranking.
    async fn retrieve(
        &self,
        collection: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "query embedding failed, using zero vector");
                vec![0.0; self.embedder.dimensions()]
            }
        };
        self.store.search(collection, &embedding, k).await
    }

    /// Build labeled context blocks and their citations, in rank order.
    ///
    /// Chunk text already contains merged image descriptions, so no image
    /// retrieval happens here: images attach to citations purely via
    /// page-number lookup into the ingesting document's image index.
    fn format_context(
        &self,
        results: &[SearchResult],
        images: &HashMap<String, PageImageIndex>,
    ) -> (String, Vec<Citation>) {
        let mut blocks = Vec::with_capacity(results.len());
        let mut citations = Vec::with_capacity(results.len());

        for (idx, result) in results.iter().enumerate() {
            let rank = idx as u32 + 1;
            let page = result.chunk.page_number;
            blocks.push(format!("[Source {rank} - Page {page}]\n{}", result.chunk.text));

            let page_images = images
                .get(&result.chunk.document_id)
                .map(|index| index.images_for_page(page))
                .unwrap_or(&[]);
            let image_paths: Vec<String> =
                page_images.iter().map(|image| image.path.clone()).collect();

            citations.push(Citation {
                source_rank: rank,
                page_number: page,
                text_snippet: snippet(&result.chunk.text, self.config.snippet_len),
                has_images: !image_paths.is_empty(),
                image_paths,
            });
        }

        (blocks.join("\n\n"), citations)
    }

    /// Assemble the prompt: system instruction, the bounded history
    /// window (oldest first), then the context and question as one user
    /// message.
    fn build_messages(
        &self,
        query: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        let window = self.config.history_exchanges * 2;
        let conversational: Vec<&ChatMessage> = history
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .collect();
        let start = conversational.len().saturating_sub(window);
        messages.extend(conversational[start..].iter().map(|m| (*m).clone()));

        messages.push(ChatMessage::user(format!(
            "Context from the document:\n{context}\n\nUser Question: {query}"
        )));
        messages
    }
}

/// Truncate to a leading snippet of at most `max_chars` characters,
/// appending an ellipsis when anything was cut. Operates on characters,
/// never splitting a UTF-8 sequence.
fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}
