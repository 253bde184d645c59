//! Hybrid retrieval engine.
//!
//! The [`HybridRetriever`] answers a [`RetrievalRequest`] by combining two
//! independent signals over the [`DocumentStore`]:
//!
//! 1. cosine similarity between the query embedding and each document, and
//! 2. the structured equality filter on `client_id`.
//!
//! A document is relevant only when it passes the filter AND its similarity
//! exceeds the configured threshold. Relevant documents become the context of
//! a single [`AnswerGenerator`] call.
//!
//! # Example
//!
//! ```rust,ignore
//! use hybrid_rag::{DocumentStore, HybridRetriever, RetrievalRequest};
//!
//! let retriever = HybridRetriever::builder()
//!     .store(Arc::new(DocumentStore::with_sample_corpus()))
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! retriever.index(|progress| println!("{progress}")).await?;
//! let result = retriever.retrieve(&RetrievalRequest::new("payment status", 101)).await?;
//! println!("{}", result.answer);
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::RetrievalConfig;
use crate::document::{
    Answer, Document, DocumentId, RetrievalRequest, RetrievalResult, RetrievalState,
    ScoredDocument,
};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;
use crate::prompt::{build_context, render_prompt};
use crate::similarity::cosine_similarity;
use crate::store::{DocumentStore, IndexProgress, IndexReport};

/// Receives every state a retrieval request enters.
///
/// Any `Fn(RetrievalState) + Send + Sync` closure is an observer.
pub trait RetrievalObserver: Send + Sync {
    /// Called once per transition, with the state just entered.
    fn on_state(&self, state: RetrievalState);
}

impl<F> RetrievalObserver for F
where
    F: Fn(RetrievalState) + Send + Sync,
{
    fn on_state(&self, state: RetrievalState) {
        self(state)
    }
}

struct StateTracker<'a> {
    current: RetrievalState,
    observer: Option<&'a dyn RetrievalObserver>,
}

impl<'a> StateTracker<'a> {
    fn new(observer: Option<&'a dyn RetrievalObserver>) -> Self {
        Self { current: RetrievalState::Idle, observer }
    }

    fn enter(&mut self, next: RetrievalState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal retrieval transition {} -> {next}",
            self.current
        );
        debug!(from = %self.current, to = %next, "retrieval state changed");
        self.current = next;
        if let Some(observer) = self.observer {
            observer.on_state(next);
        }
    }

    fn fail(&mut self, e: &RagError) {
        error!(state = %self.current, error = %e, "retrieval failed");
        self.enter(RetrievalState::Error);
    }
}

/// Score every document against the query embedding and mark filter membership.
///
/// Documents without an embedding score `0`. Similarities are clamped to
/// `[0, 1]`. The list is stably sorted by descending similarity, so ties
/// keep the store's insertion order.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] if a document embedding and the
/// query embedding differ in length.
pub fn score_documents(
    documents: Vec<Document>,
    query_embedding: &[f32],
    allowed: &HashSet<DocumentId>,
) -> Result<Vec<ScoredDocument>> {
    let mut scored = documents
        .into_iter()
        .map(|document| {
            let similarity = match &document.embedding {
                Some(embedding) => cosine_similarity(query_embedding, embedding)?.clamp(0.0, 1.0),
                None => 0.0,
            };
            let passed_filter = allowed.contains(&document.id);
            Ok(ScoredDocument { document, similarity, passed_filter })
        })
        .collect::<Result<Vec<_>>>()?;

    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    Ok(scored)
}

/// The hybrid retrieval orchestrator.
///
/// Coordinates query execution (embed → score + filter → merge → generate)
/// over a shared [`DocumentStore`]. Construct one via
/// [`HybridRetriever::builder()`].
pub struct HybridRetriever {
    config: RetrievalConfig,
    store: Arc<DocumentStore>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn AnswerGenerator>,
    observer: Option<Arc<dyn RetrievalObserver>>,
}

impl HybridRetriever {
    /// Create a new [`HybridRetrieverBuilder`].
    pub fn builder() -> HybridRetrieverBuilder {
        HybridRetrieverBuilder::default()
    }

    /// Return a reference to the retriever configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return a reference to the document store.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Index the store with this retriever's embedding provider, pausing the
    /// configured `index_delay` before each embedding call.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::index_corpus_paced`].
    pub async fn index<F>(&self, on_progress: F) -> Result<IndexReport>
    where
        F: FnMut(&IndexProgress) + Send,
    {
        self.store
            .index_corpus_paced(
                self.embedding_provider.as_ref(),
                self.config.index_delay,
                on_progress,
            )
            .await
    }

    /// Run one hybrid retrieval.
    ///
    /// Returns every document of the store scored and ordered by descending
    /// similarity, plus either a generated answer or
    /// [`Answer::NoRelevantDocuments`] when nothing was relevant (in which
    /// case the generator is not called).
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexRequired`] if the store is not initialized or any
    ///   document lacks an embedding; no collaborator is called.
    /// - [`RagError::EmbeddingError`] if the query embedding fails or times out.
    /// - [`RagError::DimensionMismatch`] if the query and document embeddings
    ///   differ in length.
    /// - [`RagError::GenerationError`] if generation fails or times out; the
    ///   error carries the scored documents.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResult> {
        if !self.store.is_indexed().await {
            let initialized = self.store.is_initialized().await;
            let unindexed = self.store.unindexed_ids().await;
            error!(initialized, ?unindexed, "retrieval attempted before indexing completed");
            return Err(RagError::IndexRequired { unindexed, initialized });
        }

        let mut tracker = StateTracker::new(self.observer.as_deref());
        info!(
            query = %request.query,
            filter_value = request.filter_value,
            "starting hybrid retrieval"
        );

        // 1. Embed the query
        tracker.enter(RetrievalState::Embedding);
        let query_embedding =
            self.embed_query(&request.query).await.inspect_err(|e| tracker.fail(e))?;

        // 2. Score every document and run the structured filter
        tracker.enter(RetrievalState::Searching);
        let documents = self.store.list_documents().await;
        let allowed = self.store.filter_by_client_id(request.filter_value).await;
        let scored = score_documents(documents, &query_embedding, &allowed)
            .inspect_err(|e| tracker.fail(e))?;

        // 3. Merge: filter AND similarity threshold
        let threshold = self.config.similarity_threshold;
        let relevant: Vec<&ScoredDocument> =
            scored.iter().filter(|d| d.is_relevant(threshold)).collect();
        info!(
            scored_count = scored.len(),
            filter_matches = allowed.len(),
            relevant_count = relevant.len(),
            threshold,
            "hybrid merge completed"
        );

        if relevant.is_empty() {
            tracker.enter(RetrievalState::Complete);
            return Ok(RetrievalResult {
                documents: scored,
                answer: Answer::NoRelevantDocuments,
                similarity_threshold: threshold,
            });
        }

        // 4. Generate the answer from the relevant context
        tracker.enter(RetrievalState::Generating);
        let context = build_context(relevant);
        let prompt = render_prompt(&self.config.prompt_template, &context, &request.query);
        let answer = match self.generate(&prompt).await {
            Ok(answer) => answer,
            Err((provider, message)) => {
                let e = RagError::GenerationError { provider, message, documents: scored };
                tracker.fail(&e);
                return Err(e);
            }
        };

        tracker.enter(RetrievalState::Complete);
        Ok(RetrievalResult {
            documents: scored,
            answer: Answer::Generated(answer),
            similarity_threshold: threshold,
        })
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let provider = self.embedding_provider.name();
        if query.is_empty() {
            return Err(RagError::embedding(provider, "query text is empty"));
        }

        let call = self.embedding_provider.embed(query);
        let embedding = with_deadline(self.config.request_timeout, call)
            .await
            .ok_or_else(|| RagError::embedding(provider, self.timeout_message()))?
            .map_err(|e| match e {
                e @ RagError::EmbeddingError { .. } => e,
                other => RagError::embedding(provider, other.to_string()),
            })?;

        if embedding.is_empty() {
            return Err(RagError::embedding(provider, "query embedding is empty"));
        }
        debug!(dimensions = embedding.len(), "query embedded");
        Ok(embedding)
    }

    /// Call the generator, returning `(provider, message)` on failure.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, (String, String)> {
        let provider = self.generator.name().to_string();
        match with_deadline(self.config.request_timeout, self.generator.generate(prompt)).await {
            None => Err((provider, self.timeout_message())),
            Some(Ok(answer)) => Ok(answer),
            Some(Err(RagError::GenerationError { provider, message, .. })) => {
                Err((provider, message))
            }
            Some(Err(other)) => Err((provider, other.to_string())),
        }
    }

    fn timeout_message(&self) -> String {
        let limit = self.config.request_timeout.unwrap_or_default();
        format!("request timed out after {limit:?}")
    }
}

/// Await `fut`, giving up after `limit` if one is set. `None` means the
/// deadline passed.
async fn with_deadline<T>(limit: Option<Duration>, fut: impl Future<Output = T>) -> Option<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Builder for constructing a [`HybridRetriever`].
///
/// `store`, `embedding_provider` and `generator` are required; `config`
/// defaults to [`RetrievalConfig::default()`] and `observer` is optional.
///
/// # Example
///
/// ```rust,ignore
/// let retriever = HybridRetriever::builder()
///     .config(RetrievalConfig::default())
///     .store(Arc::new(store))
///     .embedding_provider(Arc::new(embedder))
///     .generator(Arc::new(generator))
///     .observer(Arc::new(|state| println!("{state}")))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct HybridRetrieverBuilder {
    config: Option<RetrievalConfig>,
    store: Option<Arc<DocumentStore>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    observer: Option<Arc<dyn RetrievalObserver>>,
}

impl HybridRetrieverBuilder {
    /// Set the retriever configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document store.
    pub fn store(mut self, store: Arc<DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the answer generator.
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set an observer notified of every state transition.
    pub fn observer(mut self, observer: Arc<dyn RetrievalObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the [`HybridRetriever`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the config fails [`RetrievalConfig::validate`].
    pub fn build(self) -> Result<HybridRetriever> {
        let store =
            self.store.ok_or_else(|| RagError::ConfigError("store is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(HybridRetriever {
            config,
            store,
            embedding_provider,
            generator,
            observer: self.observer,
        })
    }
}
