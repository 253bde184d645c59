//! In-memory document store with incremental, failure-isolated indexing.
//!
//! [`DocumentStore`] owns the corpus. It is built from a fixed seed by
//! [`initialize`](DocumentStore::initialize), gains embeddings through
//! [`index_corpus`](DocumentStore::index_corpus), and answers the structured
//! equality filter with [`filter_by_client_id`](DocumentStore::filter_by_client_id).
//!
//! Embeddings only ever move from absent to present. Readers running while an
//! index pass is in flight may see a partially indexed corpus, never a
//! cleared embedding.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::corpus::{SeedRecord, sample_corpus};
use crate::document::{ClientId, Document, DocumentId};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// A progress notification emitted while indexing.
///
/// The [`Display`](fmt::Display) implementation renders the human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexProgress {
    /// About to embed a document.
    Indexing {
        /// The document being embedded.
        id: DocumentId,
    },
    /// A document received its embedding.
    Indexed {
        /// The embedded document.
        id: DocumentId,
        /// Length of the stored vector.
        dimensions: usize,
    },
    /// Embedding a document failed; it stays unindexed.
    Failed {
        /// The document left unindexed.
        id: DocumentId,
        /// Why the embedding call failed.
        reason: String,
    },
    /// The pass finished.
    Completed {
        /// Documents embedded by this pass.
        indexed: usize,
        /// Documents whose embedding failed in this pass.
        failed: usize,
        /// Documents that already had an embedding.
        skipped: usize,
    },
}

impl fmt::Display for IndexProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexProgress::Indexing { id } => write!(f, "Indexing document {id}..."),
            IndexProgress::Indexed { id, dimensions } => {
                write!(f, "Indexed document {id} ({dimensions} dimensions)")
            }
            IndexProgress::Failed { id, reason } => {
                write!(f, "Failed to index document {id}: {reason}")
            }
            IndexProgress::Completed { indexed, failed, skipped } => write!(
                f,
                "Indexing complete: {indexed} indexed, {failed} failed, {skipped} already indexed"
            ),
        }
    }
}

/// Summary of one [`DocumentStore::index_corpus`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Documents embedded by this pass.
    pub indexed: Vec<DocumentId>,
    /// Documents that already had an embedding and were left untouched.
    pub skipped: Vec<DocumentId>,
    /// Documents whose embedding failed; they remain unindexed.
    pub failed: Vec<DocumentId>,
}

impl IndexReport {
    /// Whether every document in the store is now indexed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    initialized: bool,
    documents: Vec<Document>,
    positions: HashMap<DocumentId, usize>,
}

impl StoreState {
    fn load(documents: Vec<Document>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(documents.len());
        for (position, document) in documents.iter().enumerate() {
            if positions.insert(document.id, position).is_some() {
                return Err(RagError::ConfigError(format!(
                    "duplicate document id {} in corpus",
                    document.id
                )));
            }
        }
        Ok(Self { initialized: true, documents, positions })
    }
}

/// The corpus of retrievable documents.
///
/// All operations are async-safe via `tokio::sync::RwLock`. Indexing is
/// serialized by a separate writer lock, so at most one
/// [`index_corpus`](Self::index_corpus) pass runs per store.
///
/// # Example
///
/// ```rust,ignore
/// use hybrid_rag::DocumentStore;
///
/// let store = DocumentStore::with_sample_corpus();
/// store.initialize().await?;
/// let report = store.index_corpus(&embedder, |p| println!("{p}")).await?;
/// let allowed = store.filter_by_client_id(101).await;
/// ```
#[derive(Debug, Default)]
pub struct DocumentStore {
    seed: Vec<SeedRecord>,
    state: RwLock<StoreState>,
    writer: Mutex<()>,
}

impl DocumentStore {
    /// Create an uninitialized store that will load `seed` on
    /// [`initialize`](Self::initialize).
    pub fn new(seed: impl IntoIterator<Item = SeedRecord>) -> Self {
        Self { seed: seed.into_iter().collect(), ..Self::default() }
    }

    /// Create an uninitialized store over the five-document sample corpus.
    pub fn with_sample_corpus() -> Self {
        Self::new(sample_corpus())
    }

    /// Create an initialized store from documents that may already carry
    /// embeddings (for example, ones computed by an earlier run).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if two documents share an id.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self> {
        Ok(Self { state: RwLock::new(StoreState::load(documents)?), ..Self::default() })
    }

    /// Populate the store from its seed corpus.
    ///
    /// Idempotent: once initialized, further calls are no-ops and never
    /// discard embeddings computed in between.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the seed contains duplicate ids.
    pub async fn initialize(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.initialized {
            return Ok(());
        }
        let documents: Vec<Document> = self.seed.iter().cloned().map(Document::from).collect();
        *state = StoreState::load(documents)?;
        info!(document_count = state.documents.len(), "document store initialized");
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    /// Embed every document that lacks an embedding.
    ///
    /// Equivalent to [`index_corpus_paced`](Self::index_corpus_paced) with no
    /// delay between calls.
    pub async fn index_corpus<F>(
        &self,
        provider: &dyn EmbeddingProvider,
        on_progress: F,
    ) -> Result<IndexReport>
    where
        F: FnMut(&IndexProgress) + Send,
    {
        self.index_corpus_paced(provider, Duration::ZERO, on_progress).await
    }

    /// Embed every document that lacks an embedding, pausing `delay` before
    /// each embedding call.
    ///
    /// Documents that already carry an embedding are skipped silently. A
    /// failed embedding leaves its document unindexed and the pass moves on.
    /// `on_progress` receives [`IndexProgress::Indexing`] before and
    /// [`IndexProgress::Indexed`] or [`IndexProgress::Failed`] after each
    /// embedded document, then a final [`IndexProgress::Completed`].
    ///
    /// The store is initialized first if needed. Concurrent passes on the
    /// same store are serialized.
    ///
    /// # Errors
    ///
    /// Only initialization errors are returned; per-document embedding
    /// failures are reported in the [`IndexReport`].
    pub async fn index_corpus_paced<F>(
        &self,
        provider: &dyn EmbeddingProvider,
        delay: Duration,
        mut on_progress: F,
    ) -> Result<IndexReport>
    where
        F: FnMut(&IndexProgress) + Send,
    {
        self.initialize().await?;
        let _writer = self.writer.lock().await;

        let mut report = IndexReport::default();
        let pending: Vec<(DocumentId, String)> = {
            let state = self.state.read().await;
            state
                .documents
                .iter()
                .filter_map(|d| {
                    if d.is_indexed() {
                        report.skipped.push(d.id);
                        None
                    } else {
                        Some((d.id, d.content.clone()))
                    }
                })
                .collect()
        };

        for (id, content) in pending {
            on_progress(&IndexProgress::Indexing { id });
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match embed_document(provider, &content).await {
                Ok(embedding) => {
                    let dimensions = embedding.len();
                    self.attach_embedding(id, embedding).await;
                    debug!(document.id = id, dimensions, "document indexed");
                    report.indexed.push(id);
                    on_progress(&IndexProgress::Indexed { id, dimensions });
                }
                Err(e) => {
                    warn!(document.id = id, error = %e, "embedding failed, document unindexed");
                    report.failed.push(id);
                    on_progress(&IndexProgress::Failed { id, reason: e.to_string() });
                }
            }
        }

        info!(
            indexed = report.indexed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "indexing pass completed"
        );
        on_progress(&IndexProgress::Completed {
            indexed: report.indexed.len(),
            failed: report.failed.len(),
            skipped: report.skipped.len(),
        });
        Ok(report)
    }

    async fn attach_embedding(&self, id: DocumentId, embedding: Vec<f32>) {
        let mut state = self.state.write().await;
        let Some(&position) = state.positions.get(&id) else {
            return;
        };
        let document = &mut state.documents[position];
        if document.embedding.is_none() {
            document.embedding = Some(embedding);
        }
    }

    /// A snapshot of every document, in insertion order.
    pub async fn list_documents(&self) -> Vec<Document> {
        self.state.read().await.documents.clone()
    }

    /// Look up a single document by id.
    pub async fn get(&self, id: DocumentId) -> Option<Document> {
        let state = self.state.read().await;
        state.positions.get(&id).map(|&position| state.documents[position].clone())
    }

    /// Ids of all documents whose `client_id` equals `client_id`.
    ///
    /// Empty when nothing matches. Read-only.
    pub async fn filter_by_client_id(&self, client_id: ClientId) -> HashSet<DocumentId> {
        self.state
            .read()
            .await
            .documents
            .iter()
            .filter(|d| d.client_id == client_id)
            .map(|d| d.id)
            .collect()
    }

    /// Ids of documents still lacking an embedding, in insertion order.
    ///
    /// Before initialization every seed record counts as unindexed.
    pub async fn unindexed_ids(&self) -> Vec<DocumentId> {
        let state = self.state.read().await;
        if !state.initialized {
            return self.seed.iter().map(|s| s.id).collect();
        }
        state.documents.iter().filter(|d| !d.is_indexed()).map(|d| d.id).collect()
    }

    /// Whether the store is initialized and every document has an embedding.
    pub async fn is_indexed(&self) -> bool {
        let state = self.state.read().await;
        state.initialized && state.documents.iter().all(Document::is_indexed)
    }

    /// Number of documents in the store.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.documents.is_empty()
    }
}

/// Embed one document's content, rejecting vectors of the wrong shape.
async fn embed_document(provider: &dyn EmbeddingProvider, content: &str) -> Result<Vec<f32>> {
    let embedding = provider.embed(content).await?;
    let expected = provider.dimensions();
    if embedding.is_empty() || embedding.len() != expected {
        return Err(RagError::embedding(
            provider.name(),
            format!("returned {} dimensions, expected {expected}", embedding.len()),
        ));
    }
    Ok(embedding)
}
