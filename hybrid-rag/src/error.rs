//! Error types for the `hybrid-rag` crate.

use thiserror::Error;

use crate::document::{DocumentId, ScoredDocument};

/// Errors that can occur while indexing or retrieving.
#[derive(Debug, Error)]
pub enum RagError {
    /// Retrieval was attempted before every document carried an embedding.
    #[error("Index required: {}", describe_unindexed(.unindexed, *.initialized))]
    IndexRequired {
        /// Ids of the documents still lacking an embedding. Before
        /// initialization these are the seed ids.
        unindexed: Vec<DocumentId>,
        /// Whether the store had loaded its corpus.
        initialized: bool,
    },

    /// An embedding call failed.
    ///
    /// This is the single envelope for every embedding failure mode: missing
    /// credentials, transport errors, non-2xx responses and malformed bodies.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The answer generation call failed after relevant documents were found.
    ///
    /// The scored documents computed before the failure are carried along so
    /// the caller can still show why each document was kept or dropped.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
        /// The full scored list, ordered by descending similarity.
        documents: Vec<ScoredDocument>,
    },

    /// Two vectors of different length (or an empty vector) were compared.
    #[error("Dimension mismatch: cannot compare vectors of length {left} and {right}")]
    DimensionMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }
}

fn describe_unindexed(unindexed: &[DocumentId], initialized: bool) -> String {
    if initialized {
        format!("{} document(s) have no embedding ({unindexed:?})", unindexed.len())
    } else {
        "document store not initialized".to_string()
    }
}

/// A convenience result type for hybrid retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
