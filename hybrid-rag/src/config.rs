//! Configuration for the hybrid retriever.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Similarity a filter-passing document must exceed to count as relevant.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.45;

/// The default answer prompt. `{context}` and `{query}` are substituted.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are an intelligent customer support assistant.
Use ONLY the context provided below to answer the user's question.
If the answer is not in the context, say that you did not find relevant information.
Answer professionally and concisely.

Context (database results):
{context}

User question:
{query}
";

/// Configuration parameters for the hybrid retriever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// A filter-passing document is relevant only when its similarity is
    /// strictly greater than this value.
    pub similarity_threshold: f32,
    /// Deadline applied to each embedding and generation call.
    pub request_timeout: Option<Duration>,
    /// Pause between per-document embedding calls while indexing.
    pub index_delay: Duration,
    /// Prompt sent to the generator, with `{context}` and `{query}` placeholders.
    pub prompt_template: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            request_timeout: None,
            index_delay: Duration::ZERO,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `similarity_threshold` is not within `[0, 1)` (NaN included)
    /// - `request_timeout` is zero
    /// - `prompt_template` lacks a `{context}` or `{query}` placeholder
    pub fn validate(&self) -> Result<()> {
        let threshold = self.similarity_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(RagError::ConfigError(format!(
                "similarity_threshold ({threshold}) must be within [0, 1)"
            )));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RagError::ConfigError(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        for placeholder in ["{context}", "{query}"] {
            if !self.prompt_template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt_template must contain the {placeholder} placeholder"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the relevance similarity threshold.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the deadline for each collaborator call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Set the pause between per-document embedding calls during indexing.
    pub fn index_delay(mut self, delay: Duration) -> Self {
        self.config.index_delay = delay;
        self
    }

    /// Set the prompt template.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = template.into();
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RetrievalConfig::validate`].
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
