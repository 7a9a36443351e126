//! End-to-end session tests: ingest, query, degrade, cache, and reset.

use std::sync::Arc;
use std::time::{Duration, Instant};

use docrag::config::RagConfig;
use docrag::fscache::FsDocumentCache;
use docrag::session::DocumentSession;
use docrag_core::{DecodedDocument, ExtractedImage, Page};
use docrag_model::{MockChatModel, MockDecoder, MockDescriber, MockEmbedder};

const DIMS: usize = 32;

fn passthrough_session() -> DocumentSession {
    DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::passthrough()))
        .describer(Arc::new(MockDescriber::new()))
        .chat(Arc::new(MockChatModel::new("an answer")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .build()
        .unwrap()
}

fn document_with_images() -> DecodedDocument {
    DecodedDocument {
        markdown: "## Page 1\n\nAlpha intro text.\n\n## Page 2\n\nBeta body text.\n".to_string(),
        pages: vec![
            Page { page_number: 1, text: "Alpha intro text.".to_string() },
            Page { page_number: 2, text: "Beta body text.".to_string() },
        ],
        images: vec![
            ExtractedImage {
                path: "/tmp/img_p1_01.png".to_string(),
                filename: "img_p1_01.png".to_string(),
                page_number: 1,
                sequence_index: 0,
                description: None,
            },
            ExtractedImage {
                path: "/tmp/img_p2_01.png".to_string(),
                filename: "img_p2_01.png".to_string(),
                page_number: 2,
                sequence_index: 0,
                description: None,
            },
        ],
    }
}

#[tokio::test]
async fn ingest_then_ask_produces_cited_answer() {
    let session = passthrough_session();

    let report = session.ingest(b"The annual budget was 40 million.", "report.pdf").await.unwrap();
    assert_eq!(report.page_count, 1);
    assert_eq!(report.image_count, 0);
    assert!(report.chunk_count > 0);
    assert!(!report.already_indexed);

    let answer = session.ask("what was the budget?", 5).await.unwrap();
    assert_eq!(answer.answer, "an answer");
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].page_number, 1);
    assert!(answer.citations[0].text_snippet.contains("40 million"));
}

#[tokio::test]
async fn query_before_ingestion_returns_fixed_answer() {
    let session = passthrough_session();
    let answer = session.ask("anything?", 5).await.unwrap();
    assert_eq!(answer.answer, "No document has been ingested yet.");
    assert!(answer.citations.is_empty());
}

#[tokio::test]
async fn reingesting_identical_bytes_short_circuits() {
    let session = passthrough_session();
    let first = session.ingest(b"same content", "doc.pdf").await.unwrap();
    let second = session.ingest(b"same content", "doc.pdf").await.unwrap();

    assert!(!first.already_indexed);
    assert!(second.already_indexed);
    assert_eq!(second.chunk_count, first.chunk_count);

    let status = session.status().await;
    assert_eq!(status.chunk_count, first.chunk_count);
}

#[tokio::test]
async fn same_name_different_bytes_replaces_previous_revision() {
    let session = passthrough_session();
    let first = session.ingest(b"first revision content", "doc.pdf").await.unwrap();
    let second = session.ingest(b"second revision with rather more words in it", "doc.pdf").await.unwrap();

    assert!(!second.already_indexed);
    let status = session.status().await;
    // Only the latest revision's chunks remain.
    assert_eq!(status.chunk_count, second.chunk_count);
    assert_ne!(status.chunk_count, first.chunk_count + second.chunk_count);

    let docs = session.documents().await;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name, "doc.pdf");
}

#[tokio::test]
async fn failed_descriptions_degrade_and_are_counted() {
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::new(document_with_images())))
        .describer(Arc::new(MockDescriber::failing()))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .build()
        .unwrap();

    let report = session.ingest(b"whatever", "illustrated.pdf").await.unwrap();
    assert_eq!(report.image_count, 2);
    assert_eq!(report.degraded_images, 2);
    assert!(report.chunk_count > 0);

    // The placeholder is merged into page text, so it is retrievable.
    let answer = session.ask("alpha", 5).await.unwrap();
    let merged: Vec<&str> =
        answer.citations.iter().map(|c| c.text_snippet.as_str()).collect();
    assert!(
        merged.iter().any(|s| s.contains("[Image from document - error:")),
        "degraded placeholder not found in {merged:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ingestion_runs_as_a_spawned_task() {
    let session = Arc::new(passthrough_session());

    let handle = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.ingest(b"spawned ingestion body", "doc.pdf").await }
    });

    let report = handle.await.unwrap().unwrap();
    assert!(report.chunk_count > 0);
    assert!(session.status().await.is_ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_answers_while_images_are_being_described() {
    let session = Arc::new(
        DocumentSession::builder()
            .decoder(Arc::new(MockDecoder::new(document_with_images())))
            .describer(Arc::new(MockDescriber::new().with_delay(Duration::from_millis(400))))
            .chat(Arc::new(MockChatModel::new("ok")))
            .embedder(Arc::new(MockEmbedder::new(DIMS)))
            .build()
            .unwrap(),
    );

    let ingest = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.ingest(b"whatever", "slow.pdf").await }
    });

    // Let the ingestion reach its first describe call.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let status = session.status().await;
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "status blocked for {:?} behind an in-flight ingestion",
        started.elapsed()
    );
    assert!(!status.is_ready);

    let report = ingest.await.unwrap().unwrap();
    assert_eq!(report.image_count, 2);
    assert!(session.status().await.is_ready);
}

#[tokio::test]
async fn slow_descriptions_time_out_to_placeholders() {
    let config =
        RagConfig::builder().describe_timeout(Duration::from_millis(20)).build().unwrap();
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::new(document_with_images())))
        .describer(Arc::new(MockDescriber::new().with_delay(Duration::from_secs(5))))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .config(config)
        .build()
        .unwrap();

    let report = session.ingest(b"whatever", "slow.pdf").await.unwrap();
    assert_eq!(report.degraded_images, 2);
}

#[tokio::test]
async fn successful_descriptions_enrich_page_text_and_citations() {
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::new(document_with_images())))
        .describer(Arc::new(MockDescriber::new()))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .build()
        .unwrap();

    let report = session.ingest(b"whatever", "illustrated.pdf").await.unwrap();
    assert_eq!(report.degraded_images, 0);

    let answer = session.ask("img_p1_01", 5).await.unwrap();
    let cited_page_1 =
        answer.citations.iter().find(|c| c.page_number == 1).expect("page 1 cited");
    assert!(cited_page_1.has_images);
    assert_eq!(cited_page_1.image_paths, vec!["/tmp/img_p1_01.png"]);
    assert!(cited_page_1.text_snippet.contains("Alpha intro text."));
}

#[tokio::test]
async fn decode_failure_falls_back_to_plain_extraction() {
    let plain = DecodedDocument {
        markdown: "## Page 1\n\nplain fallback text\n".to_string(),
        pages: vec![Page { page_number: 1, text: "plain fallback text".to_string() }],
        images: Vec::new(),
    };
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::failing().with_plain_fallback(plain)))
        .describer(Arc::new(MockDescriber::new()))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .build()
        .unwrap();

    let report = session.ingest(b"corrupt bytes", "broken.pdf").await.unwrap();
    assert_eq!(report.page_count, 1);

    let answer = session.ask("fallback", 5).await.unwrap();
    assert!(answer.citations[0].text_snippet.contains("plain fallback text"));
}

#[tokio::test]
async fn decode_failure_without_fallback_propagates() {
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::failing()))
        .describer(Arc::new(MockDescriber::new()))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .build()
        .unwrap();

    let err = session.ingest(b"corrupt bytes", "broken.pdf").await;
    assert!(err.is_err());
    assert!(!session.status().await.is_ready);
}

#[tokio::test]
async fn failing_embedder_degrades_chunks_but_ingestion_succeeds() {
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::passthrough()))
        .describer(Arc::new(MockDescriber::new()))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::failing(DIMS)))
        .build()
        .unwrap();

    let report = session.ingest(b"content that cannot be embedded", "doc.pdf").await.unwrap();
    assert!(report.chunk_count > 0);
    assert_eq!(report.degraded_embeddings, report.chunk_count);
    assert!(session.status().await.is_ready);
}

#[tokio::test]
async fn cache_hit_skips_decode_on_second_session() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(FsDocumentCache::new(dir.path()).unwrap());

    let first = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::passthrough()))
        .describer(Arc::new(MockDescriber::new()))
        .chat(Arc::new(MockChatModel::new("ok")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .cache(cache.clone())
        .build()
        .unwrap();
    first.ingest(b"cached once, reused later", "doc.pdf").await.unwrap();

    // Same cache, failing decoder: only a cache hit can make this work.
    let second = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::failing()))
        .describer(Arc::new(MockDescriber::failing()))
        .chat(Arc::new(MockChatModel::new("from cache")))
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .cache(cache)
        .build()
        .unwrap();
    let report = second.ingest(b"cached once, reused later", "doc.pdf").await.unwrap();

    assert_eq!(report.page_count, 1);
    assert_eq!(report.degraded_images, 0);
    let answer = second.ask("reused?", 5).await.unwrap();
    assert_eq!(answer.answer, "from cache");
    assert!(answer.citations[0].text_snippet.contains("cached once"));
}

#[tokio::test]
async fn reset_clears_only_the_active_document() {
    let session = passthrough_session();
    session.ingest(b"first document body", "first.pdf").await.unwrap();
    session.ingest(b"second document body", "second.pdf").await.unwrap();

    let before = session.documents().await;
    assert_eq!(before.len(), 2);

    // second.pdf is active (most recently ingested).
    session.reset().await.unwrap();

    let after = session.documents().await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].name, "first.pdf");

    let status = session.status().await;
    assert!(status.is_ready);
    assert_eq!(status.active_document_name, None);
    assert_eq!(status.chunk_count, after[0].chunk_count);

    let answer = session.ask("first", 5).await.unwrap();
    assert!(answer.citations.iter().all(|c| c.text_snippet.contains("first document body")));
}

#[tokio::test]
async fn clear_history_keeps_documents_queryable() {
    let session = passthrough_session();
    session.ingest(b"some document body", "doc.pdf").await.unwrap();
    session.ask("one", 5).await.unwrap();
    session.ask("two", 5).await.unwrap();

    session.clear_history().await;

    let status = session.status().await;
    assert!(status.is_ready);
    let answer = session.ask("three", 5).await.unwrap();
    assert_eq!(answer.citations.len(), 1);
}

#[tokio::test]
async fn session_history_feeds_subsequent_prompts() {
    let chat = Arc::new(MockChatModel::new("an answer"));
    let session = DocumentSession::builder()
        .decoder(Arc::new(MockDecoder::passthrough()))
        .describer(Arc::new(MockDescriber::new()))
        .chat(chat.clone())
        .embedder(Arc::new(MockEmbedder::new(DIMS)))
        .build()
        .unwrap();
    session.ingest(b"document body", "doc.pdf").await.unwrap();

    session.ask("first question", 5).await.unwrap();
    session.ask("second question", 5).await.unwrap();

    let requests = chat.requests();
    assert_eq!(requests.len(), 2);
    // First call has no prior exchanges; second carries the first exchange.
    assert_eq!(requests[0].len(), 2);
    assert_eq!(requests[1].len(), 4);
    assert_eq!(requests[1][1].content, "first question");
    assert_eq!(requests[1][2].content, "an answer");
}
