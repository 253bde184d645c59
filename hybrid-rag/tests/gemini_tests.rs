//! Tests for the Gemini collaborators against a mock HTTP server.

#![cfg(feature = "gemini")]

use std::sync::Arc;

use hybrid_rag::gemini::DEFAULT_EMBEDDING_MODEL;
use hybrid_rag::{
    AnswerGenerator, DocumentStore, EmbeddingProvider, GeminiConfig, GeminiEmbeddingProvider,
    GeminiGenerator, HybridRetriever, RagError, RetrievalRequest,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMBED_PATH: &str = "/models/text-embedding-004:embedContent";
const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn config(server: &MockServer) -> GeminiConfig {
    GeminiConfig::new("test-key").with_base_url(server.uri())
}

#[tokio::test]
async fn embed_posts_text_and_returns_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "model": "models/text-embedding-004",
            "content": { "parts": [{ "text": "hello" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": { "values": [0.1, 0.2, 0.3] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiEmbeddingProvider::new(config(&server)).unwrap();
    let embedding = provider.embed("hello").await.unwrap();

    assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(provider.name(), "Gemini");
    assert_eq!(provider.dimensions(), 768);
}

#[tokio::test]
async fn api_error_envelope_becomes_embedding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let provider = GeminiEmbeddingProvider::new(config(&server)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();

    match err {
        RagError::EmbeddingError { provider, message } => {
            assert_eq!(provider, "Gemini");
            assert!(message.contains("403"), "unexpected message: {message}");
            assert!(message.contains("API key not valid"), "unexpected message: {message}");
        }
        other => panic!("expected EmbeddingError, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_api_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider =
        GeminiEmbeddingProvider::new(GeminiConfig::default().with_base_url(server.uri())).unwrap();
    let err = provider.embed("hello").await.unwrap_err();

    assert!(matches!(
        err,
        RagError::EmbeddingError { ref message, .. } if message == "API key missing"
    ));
}

#[tokio::test]
async fn malformed_and_empty_bodies_are_embedding_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/broken:embedContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/empty:embedContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": [] } })),
        )
        .mount(&server)
        .await;

    let broken =
        GeminiEmbeddingProvider::new(config(&server).with_embedding_model("broken", 3)).unwrap();
    let err = broken.embed("hello").await.unwrap_err();
    assert!(matches!(
        err,
        RagError::EmbeddingError { ref message, .. } if message.contains("parse")
    ));

    let empty =
        GeminiEmbeddingProvider::new(config(&server).with_embedding_model("models/empty", 3))
            .unwrap();
    let err = empty.embed("hello").await.unwrap_err();
    assert!(matches!(
        err,
        RagError::EmbeddingError { ref message, .. } if message.contains("no embedding values")
    ));
}

#[tokio::test]
async fn generate_joins_text_parts_of_first_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "the prompt" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {
                    "content": {
                        "parts": [{ "text": "Your payment " }, { "text": "was processed." }]
                    }
                },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = GeminiGenerator::new(config(&server)).unwrap();
    let answer = generator.generate("the prompt").await.unwrap();

    assert_eq!(answer, "Your payment was processed.");
}

#[tokio::test]
async fn generation_failures_become_generation_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/silent:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let generator = GeminiGenerator::new(config(&server)).unwrap();
    match generator.generate("prompt").await.unwrap_err() {
        RagError::GenerationError { provider, message, documents } => {
            assert_eq!(provider, "Gemini");
            assert!(message.contains("500") && message.contains("upstream exploded"));
            assert!(documents.is_empty());
        }
        other => panic!("expected GenerationError, got {other:?}"),
    }

    let silent = GeminiGenerator::new(config(&server).with_generation_model("silent")).unwrap();
    let err = silent.generate("prompt").await.unwrap_err();
    assert!(matches!(
        err,
        RagError::GenerationError { ref message, .. } if message.contains("no text")
    ));
}

#[tokio::test]
async fn retriever_runs_end_to_end_over_gemini() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": { "values": [0.6, 0.8, 0.0] }
        })))
        .expect(6)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "All three are on file." }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gemini = config(&server).with_embedding_model(DEFAULT_EMBEDDING_MODEL, 3);
    let retriever = HybridRetriever::builder()
        .store(Arc::new(DocumentStore::with_sample_corpus()))
        .embedding_provider(Arc::new(GeminiEmbeddingProvider::new(gemini.clone()).unwrap()))
        .generator(Arc::new(GeminiGenerator::new(gemini).unwrap()))
        .build()
        .unwrap();

    let report = retriever.index(|_| {}).await.unwrap();
    assert!(report.is_complete());

    let result = retriever.retrieve(&RetrievalRequest::new("anything", 101)).await.unwrap();
    let relevant: Vec<u64> = result.relevant().map(|d| d.document.id).collect();
    assert_eq!(relevant, vec![1, 3, 5]);
    assert_eq!(result.answer.text(), "All three are on file.");
}
