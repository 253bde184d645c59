//! Answer generator trait for the final synthesis call.

use async_trait::async_trait;

use crate::error::Result;

/// A text-generation backend that answers a fully assembled prompt.
///
/// The retriever builds the prompt (instruction, context and query, see
/// [`prompt`](crate::prompt)); the generator only turns it into text.
/// Failures should be reported as
/// [`RagError::GenerationError`](crate::RagError::GenerationError) with an
/// empty `documents` list; the retriever fills in the scored documents.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate a free-text answer for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A short name identifying the backend in logs and errors.
    fn name(&self) -> &str {
        "custom"
    }
}
