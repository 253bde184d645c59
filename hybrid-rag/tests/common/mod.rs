//! Deterministic collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hybrid_rag::{AnswerGenerator, EmbeddingProvider, RagError, Result, sample_corpus};

pub const DIM: usize = 4;
pub const QUERY: &str = "What is the status of my payment?";

/// Unit vector along the first axis; the query direction in the fixtures.
pub fn query_vector() -> Vec<f32> {
    vec![1.0, 0.0, 0.0, 0.0]
}

/// A unit vector whose cosine similarity with [`query_vector`] is `similarity`.
pub fn vector_with_similarity(similarity: f32) -> Vec<f32> {
    vec![similarity, (1.0 - similarity * similarity).sqrt(), 0.0, 0.0]
}

/// Embedder that looks vectors up by exact text.
///
/// Unknown texts fail, as do texts registered with [`TableEmbedder::fail_on`].
#[derive(Default)]
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    failing: Vec<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl TableEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.table.insert(text.into(), vector);
        self
    }

    pub fn fail_on(mut self, text: impl Into<String>) -> Self {
        self.failing.push(text.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.iter().any(|t| t == text) {
            return Err(RagError::EmbeddingError {
                provider: "table".into(),
                message: "simulated outage".into(),
            });
        }
        self.table.get(text).cloned().ok_or_else(|| RagError::EmbeddingError {
            provider: "table".into(),
            message: format!("no vector registered for {text:?}"),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Embedder for the sample corpus engineered so that, against [`QUERY`],
/// document 1 scores 0.9, document 3 scores 0.2, document 5 scores 0.9 and
/// documents 2 and 4 score 0.
pub fn sample_embedder() -> TableEmbedder {
    let vectors: HashMap<u64, Vec<f32>> = HashMap::from([
        (1, vector_with_similarity(0.9)),
        (2, vec![0.0, 0.0, 1.0, 0.0]),
        (3, vector_with_similarity(0.2)),
        (4, vec![0.0, 0.0, 0.0, 1.0]),
        (5, vector_with_similarity(0.9)),
    ]);
    sample_corpus()
        .into_iter()
        .fold(TableEmbedder::new().with(QUERY, query_vector()), |embedder, seed| {
            let vector = vectors[&seed.id].clone();
            embedder.with(seed.content, vector)
        })
}

/// Generator that records every prompt and answers with a fixed reply.
pub struct RecordingGenerator {
    reply: std::result::Result<String, String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn answering(reply: impl Into<String>) -> Self {
        Self { reply: Ok(reply.into()), delay: None, prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { reply: Err(message.into()), delay: None, prompts: Mutex::new(Vec::new()) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(|message| RagError::GenerationError {
            provider: "recording".into(),
            message,
            documents: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "recording"
    }
}
