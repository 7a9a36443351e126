//! Integration tests for retrieval, prompt assembly, and citations.

use std::collections::HashMap;
use std::sync::Arc;

use docrag::config::RagConfig;
use docrag::document::{Chunk, PageImageIndex};
use docrag::engine::RagEngine;
use docrag::inmemory::InMemoryVectorStore;
use docrag::vectorstore::VectorStore;
use docrag_core::{ChatMessage, EmbeddingProvider, ExtractedImage, Role};
use docrag_model::{MockChatModel, MockEmbedder};

const DIMS: usize = 32;
const COLLECTION: &str = "test";

fn chunk(id: &str, page: u32, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding,
        page_number: page,
        sequence_index: 0,
        document_id: "doc-1".to_string(),
    }
}

async fn seeded_store(embedder: &MockEmbedder, texts: &[(&str, u32, &str)]) -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection(COLLECTION, DIMS).await.unwrap();
    let chunks: Vec<Chunk> = {
        let mut out = Vec::new();
        for (id, page, text) in texts {
            let embedding = embedder.embed(text).await.unwrap();
            out.push(chunk(id, *page, text, embedding));
        }
        out
    };
    store.upsert(COLLECTION, &chunks).await.unwrap();
    store
}

#[tokio::test]
async fn answer_carries_citations_in_rank_order() {
    let embedder = MockEmbedder::new(DIMS);
    let store = seeded_store(
        &embedder,
        &[
            ("c1", 2, "the reactor core temperature limit is 600 degrees"),
            ("c2", 5, "coolant flow rates are measured at the inlet"),
            ("c3", 9, "annual maintenance schedules and inspection notes"),
        ],
    )
    .await;
    let chat = Arc::new(MockChatModel::new("The limit is 600 degrees (page 2)."));
    let engine = RagEngine::new(
        Arc::new(embedder),
        store,
        chat,
        RagConfig::builder().top_k(3).build().unwrap(),
    );

    let answer = engine
        .answer(COLLECTION, "what is the reactor temperature limit?", &[], 3, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(answer.answer, "The limit is 600 degrees (page 2).");
    assert_eq!(answer.citations.len(), 3);
    for (idx, citation) in answer.citations.iter().enumerate() {
        assert_eq!(citation.source_rank, idx as u32 + 1);
        assert!(!citation.text_snippet.is_empty());
        assert!(!citation.has_images);
    }
    // The most similar chunk shares the query's vocabulary.
    assert_eq!(answer.citations[0].page_number, 2);
}

#[tokio::test]
async fn zero_k_falls_back_to_configured_top_k() {
    let embedder = MockEmbedder::new(DIMS);
    let store = seeded_store(
        &embedder,
        &[("c1", 1, "first passage"), ("c2", 2, "second passage"), ("c3", 3, "third passage")],
    )
    .await;
    let chat = Arc::new(MockChatModel::new("ok"));
    let engine = RagEngine::new(
        Arc::new(embedder),
        store,
        chat,
        RagConfig::builder().top_k(2).build().unwrap(),
    );

    let answer =
        engine.answer(COLLECTION, "passage", &[], 0, &HashMap::new()).await.unwrap();
    assert_eq!(answer.citations.len(), 2);
}

#[tokio::test]
async fn empty_collection_yields_no_context_answer_without_chat_call() {
    let embedder = MockEmbedder::new(DIMS);
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection(COLLECTION, DIMS).await.unwrap();
    let chat = Arc::new(MockChatModel::new("should not be called"));
    let engine =
        RagEngine::new(Arc::new(embedder), store, chat.clone(), RagConfig::default());

    let answer =
        engine.answer(COLLECTION, "anything", &[], 5, &HashMap::new()).await.unwrap();

    assert_eq!(answer.answer, "No information about this is available in the indexed document.");
    assert!(answer.citations.is_empty());
    assert!(chat.requests().is_empty());
}

#[tokio::test]
async fn chat_failure_degrades_to_error_answer_with_empty_citations() {
    let embedder = MockEmbedder::new(DIMS);
    let store =
        seeded_store(&embedder, &[("c1", 1, "some indexed content about widgets")]).await;
    let chat = Arc::new(MockChatModel::failing());
    let engine = RagEngine::new(Arc::new(embedder), store, chat, RagConfig::default());

    let answer =
        engine.answer(COLLECTION, "widgets?", &[], 5, &HashMap::new()).await.unwrap();

    assert!(answer.answer.starts_with("Error generating response:"));
    assert!(answer.citations.is_empty());
}

#[tokio::test]
async fn failing_query_embedding_degrades_instead_of_erroring() {
    let good = MockEmbedder::new(DIMS);
    let store = seeded_store(&good, &[("c1", 1, "indexed text")]).await;
    let chat = Arc::new(MockChatModel::new("degraded but answered"));
    let engine =
        RagEngine::new(Arc::new(MockEmbedder::failing(DIMS)), store, chat, RagConfig::default());

    let answer =
        engine.answer(COLLECTION, "anything", &[], 5, &HashMap::new()).await.unwrap();

    // Zero-vector retrieval still returns results, just with zero scores.
    assert_eq!(answer.answer, "degraded but answered");
    assert_eq!(answer.citations.len(), 1);
}

#[tokio::test]
async fn history_window_keeps_only_recent_exchanges() {
    let embedder = MockEmbedder::new(DIMS);
    let store = seeded_store(&embedder, &[("c1", 1, "context text")]).await;
    let chat = Arc::new(MockChatModel::new("ok"));
    let engine = RagEngine::new(
        Arc::new(embedder),
        store,
        chat.clone(),
        RagConfig::builder().history_exchanges(2).build().unwrap(),
    );

    let mut history = Vec::new();
    for i in 0..5 {
        history.push(ChatMessage::user(format!("question {i}")));
        history.push(ChatMessage::assistant(format!("answer {i}")));
    }

    engine.answer(COLLECTION, "current question", &history, 5, &HashMap::new()).await.unwrap();

    let requests = chat.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0];

    // system + 2 exchanges (4 messages) + the user message with context
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].content, "question 3");
    assert_eq!(messages[2].content, "answer 3");
    assert_eq!(messages[3].content, "question 4");
    assert_eq!(messages[4].content, "answer 4");
    assert!(messages[5].content.starts_with("Context from the document:"));
    assert!(messages[5].content.contains("[Source 1 - Page 1]"));
    assert!(messages[5].content.ends_with("User Question: current question"));
}

#[tokio::test]
async fn citations_attach_images_by_page_lookup() {
    let embedder = MockEmbedder::new(DIMS);
    let store = seeded_store(
        &embedder,
        &[("c1", 3, "a page with a diagram"), ("c2", 7, "a page with no pictures")],
    )
    .await;
    let chat = Arc::new(MockChatModel::new("ok"));
    let engine = RagEngine::new(Arc::new(embedder), store, chat, RagConfig::default());

    let extracted = vec![ExtractedImage {
        path: "/tmp/fig_p3_01.png".to_string(),
        filename: "fig_p3_01.png".to_string(),
        page_number: 3,
        sequence_index: 0,
        description: Some("A wiring diagram.".to_string()),
    }];
    let images = HashMap::from([("doc-1".to_string(), PageImageIndex::from_images(&extracted))]);

    let answer = engine.answer(COLLECTION, "diagram", &[], 5, &images).await.unwrap();

    let with_images: Vec<&docrag::document::Citation> =
        answer.citations.iter().filter(|c| c.page_number == 3).collect();
    assert_eq!(with_images.len(), 1);
    assert!(with_images[0].has_images);
    assert_eq!(with_images[0].image_paths, vec!["/tmp/fig_p3_01.png"]);

    let without = answer.citations.iter().find(|c| c.page_number == 7).unwrap();
    assert!(!without.has_images);
    assert!(without.image_paths.is_empty());
}
