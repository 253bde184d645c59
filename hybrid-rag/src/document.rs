//! Data types for documents, scored results, and retrieval requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, store-unique document identifier.
pub type DocumentId = u64;

/// The value matched by the structured equality filter.
pub type ClientId = i64;

/// A retrievable document and its (optionally absent) embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: DocumentId,
    /// The text content of the document.
    pub content: String,
    /// The owning client; the field the structured filter matches on.
    pub client_id: ClientId,
    /// Free-form category label.
    pub category: String,
    /// The vector embedding of `content`, set once by indexing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Whether the document has been given an embedding.
    pub fn is_indexed(&self) -> bool {
        self.embedding.is_some()
    }
}

/// A [`Document`] annotated with both retrieval signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    /// The scored document.
    #[serde(flatten)]
    pub document: Document,
    /// Cosine similarity to the query, clamped to `[0, 1]`; `0` when the
    /// document has no embedding.
    pub similarity: f32,
    /// Whether the document's `client_id` matched the filter value.
    pub passed_filter: bool,
}

impl ScoredDocument {
    /// The merge predicate: the filter passed AND similarity exceeds `threshold`.
    ///
    /// The two signals are never blended; failing either one excludes the document.
    pub fn is_relevant(&self, threshold: f32) -> bool {
        self.passed_filter && self.similarity > threshold
    }
}

/// A single hybrid retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalRequest {
    /// Natural-language query, embedded for the vector signal.
    pub query: String,
    /// Value the structured filter compares `client_id` against.
    pub filter_value: ClientId,
}

impl RetrievalRequest {
    /// Create a request for `query` restricted to documents of `filter_value`.
    pub fn new(query: impl Into<String>, filter_value: ClientId) -> Self {
        Self { query: query.into(), filter_value }
    }
}

/// The final answer attached to a completed retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Answer {
    /// Text returned by the answer generator.
    Generated(String),
    /// No document was relevant, so generation was skipped.
    NoRelevantDocuments,
}

impl Answer {
    /// Message reported in place of a generated answer when nothing was relevant.
    pub const NO_RELEVANT_DOCUMENTS: &'static str =
        "No relevant documents were found matching the criteria.";

    /// The answer text, or the "no relevant documents" message.
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::NoRelevantDocuments => Self::NO_RELEVANT_DOCUMENTS,
        }
    }

    /// Whether the answer came from the generator.
    pub fn is_generated(&self) -> bool {
        matches!(self, Answer::Generated(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// The outcome of a successful retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// Every document in the store, ordered by descending similarity.
    pub documents: Vec<ScoredDocument>,
    /// The generated answer, or the "no relevant documents" sentinel.
    pub answer: Answer,
    /// Threshold the relevance decision was made against.
    pub similarity_threshold: f32,
}

impl RetrievalResult {
    /// The relevant subset of [`documents`](Self::documents), in ranked order.
    pub fn relevant(&self) -> impl Iterator<Item = &ScoredDocument> {
        let threshold = self.similarity_threshold;
        self.documents.iter().filter(move |d| d.is_relevant(threshold))
    }
}

/// Lifecycle of a single retrieval request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalState {
    /// No request in flight.
    Idle,
    /// Waiting on the query embedding.
    Embedding,
    /// Scoring, filtering and merging.
    Searching,
    /// Waiting on the answer generator.
    Generating,
    /// Finished successfully.
    Complete,
    /// Finished with a failure.
    Error,
}

impl RetrievalState {
    /// Whether the state ends the request.
    pub fn is_terminal(self) -> bool {
        matches!(self, RetrievalState::Complete | RetrievalState::Error)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: RetrievalState) -> bool {
        use RetrievalState::*;
        matches!(
            (self, next),
            (Idle, Embedding)
                | (Embedding, Searching)
                | (Searching, Generating)
                | (Searching, Complete)
                | (Generating, Complete)
                | (Embedding | Searching | Generating, Error)
        )
    }
}

impl fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetrievalState::Idle => "IDLE",
            RetrievalState::Embedding => "EMBEDDING",
            RetrievalState::Searching => "SEARCHING",
            RetrievalState::Generating => "GENERATING",
            RetrievalState::Complete => "COMPLETE",
            RetrievalState::Error => "ERROR",
        };
        f.write_str(name)
    }
}
