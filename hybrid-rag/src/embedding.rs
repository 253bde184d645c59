//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. Every failure mode of the backend (missing credentials,
/// transport errors, non-2xx responses, malformed bodies) must surface as
/// [`RagError::EmbeddingError`](crate::RagError::EmbeddingError).
///
/// # Example
///
/// ```rust,ignore
/// use hybrid_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single, non-empty text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name identifying the backend in logs and errors.
    fn name(&self) -> &str {
        "custom"
    }
}
