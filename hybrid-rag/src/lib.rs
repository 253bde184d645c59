//! # hybrid-rag
//!
//! Hybrid retrieval for answer generation: dense-vector similarity combined
//! with a structured equality filter.
//!
//! ## Overview
//!
//! A [`HybridRetriever`] answers a [`RetrievalRequest`] in four steps:
//!
//! 1. embed the query with an [`EmbeddingProvider`],
//! 2. score every document of the [`DocumentStore`] by [`cosine_similarity`]
//!    and, independently, select the ids whose `client_id` equals the filter value,
//! 3. keep the documents that pass the filter AND exceed the similarity
//!    threshold (`0.45` by default),
//! 4. hand those documents as context to an [`AnswerGenerator`].
//!
//! The full scored list is always returned, so callers can audit why each
//! document was included or excluded.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hybrid_rag::gemini::{GeminiConfig, GeminiEmbeddingProvider, GeminiGenerator};
//! use hybrid_rag::{DocumentStore, HybridRetriever, RetrievalRequest};
//!
//! let config = GeminiConfig::from_env();
//! let retriever = HybridRetriever::builder()
//!     .store(Arc::new(DocumentStore::with_sample_corpus()))
//!     .embedding_provider(Arc::new(GeminiEmbeddingProvider::new(config.clone())?))
//!     .generator(Arc::new(GeminiGenerator::new(config)?))
//!     .build()?;
//!
//! retriever.index(|progress| println!("{progress}")).await?;
//! let result = retriever.retrieve(&RetrievalRequest::new("payment status", 101)).await?;
//! ```
//!
//! ## Features
//!
//! - `gemini` (default): Gemini REST implementations of both collaborators.

pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod prompt;
pub mod similarity;
pub mod store;

#[cfg(feature = "gemini")]
pub mod gemini;

pub use config::{
    DEFAULT_PROMPT_TEMPLATE, DEFAULT_SIMILARITY_THRESHOLD, RetrievalConfig, RetrievalConfigBuilder,
};
pub use corpus::{SeedRecord, sample_corpus};
pub use document::{
    Answer, ClientId, Document, DocumentId, RetrievalRequest, RetrievalResult, RetrievalState,
    ScoredDocument,
};
pub use embedding::EmbeddingProvider;
pub use engine::{HybridRetriever, HybridRetrieverBuilder, RetrievalObserver, score_documents};
pub use error::{RagError, Result};
pub use generation::AnswerGenerator;
pub use similarity::cosine_similarity;
pub use store::{DocumentStore, IndexProgress, IndexReport};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiEmbeddingProvider, GeminiGenerator};
