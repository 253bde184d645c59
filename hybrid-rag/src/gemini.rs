//! Gemini embedding and generation collaborators over the Gemini REST API.
//!
//! This module is only available when the `gemini` feature is enabled.
//!
//! Both collaborators share one transport and normalize every failure
//! (missing API key, transport error, non-2xx status, malformed body) into a
//! single error envelope: [`RagError::EmbeddingError`] for embeddings and
//! [`RagError::GenerationError`] for generation.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;

/// The default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// The dimensionality of `text-embedding-004`.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// The default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

const PROVIDER: &str = "Gemini";

/// Environment variables searched for the API key, in order.
const API_KEY_VARS: [&str; 3] = ["GOOGLE_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Connection settings shared by [`GeminiEmbeddingProvider`] and [`GeminiGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// API key; when absent every call fails with an "API key missing" error.
    pub api_key: Option<String>,
    /// API base URL, without a trailing `/models`.
    pub base_url: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Dimensionality of vectors returned by `embedding_model`.
    pub dimensions: usize,
    /// Model used for answer generation.
    pub generation_model: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GeminiConfig {
    /// Create a config with the given API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: Some(api_key.into()), ..Self::default() }
    }

    /// Read the API key from the first non-empty of `GOOGLE_API_KEY`,
    /// `GEMINI_API_KEY` and `API_KEY`.
    ///
    /// A missing key is not an error here; calls fail later.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|key| !key.is_empty());
        Self { api_key, ..Self::default() }
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the embedding model and the dimensionality it produces.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Set the generation model.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Transport ──────────────────────────────────────────────────────

struct GeminiTransport {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiTransport {
    fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build().map_err(|e| {
            RagError::ConfigError(format!("failed to build Gemini HTTP client: {e}"))
        })?;
        Ok(Self { client, config })
    }

    fn url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:{method}", self.config.base_url.trim_end_matches('/'))
    }

    /// POST `body` to `model:method`, returning a failure message on any error.
    async fn post<Req, Res>(
        &self,
        model: &str,
        method: &str,
        body: &Req,
    ) -> std::result::Result<Res, String>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        let api_key = self.config.api_key.as_deref().ok_or("API key missing")?;

        let response = self
            .client
            .post(self.url(model, method))
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(format!("API returned {status}: {detail}"));
        }

        response.json().await.map_err(|e| format!("failed to parse response: {e}"))
    }
}

// ── EmbeddingProvider implementation ───────────────────────────────

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use hybrid_rag::gemini::{GeminiConfig, GeminiEmbeddingProvider};
///
/// let provider = GeminiEmbeddingProvider::new(GeminiConfig::from_env())?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    transport: GeminiTransport,
}

impl GeminiEmbeddingProvider {
    /// Create a provider from the given connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Ok(Self { transport: GeminiTransport::new(config)? })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = &self.transport.config.embedding_model;
        debug!(provider = PROVIDER, model = %model, text_len = text.len(), "embedding single text");

        let request = EmbedContentRequest {
            model: format!("models/{}", model.strip_prefix("models/").unwrap_or(model)),
            content: Content { role: None, parts: vec![Part { text }] },
        };
        let response: EmbedContentResponse =
            self.transport.post(model, "embedContent", &request).await.map_err(|message| {
                error!(provider = PROVIDER, error = %message, "embedding request failed");
                RagError::embedding(PROVIDER, message)
            })?;

        match response.embedding {
            Some(embedding) if !embedding.values.is_empty() => Ok(embedding.values),
            _ => {
                error!(provider = PROVIDER, "embedding response carried no values");
                Err(RagError::embedding(PROVIDER, "response contained no embedding values"))
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.transport.config.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// ── AnswerGenerator implementation ─────────────────────────────────

/// An [`AnswerGenerator`] backed by the Gemini `generateContent` endpoint.
///
/// The answer is the concatenated text parts of the first candidate.
pub struct GeminiGenerator {
    transport: GeminiTransport,
}

impl GeminiGenerator {
    /// Create a generator from the given connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Ok(Self { transport: GeminiTransport::new(config)? })
    }

    fn failure(message: impl Into<String>) -> RagError {
        RagError::GenerationError {
            provider: PROVIDER.to_string(),
            message: message.into(),
            documents: Vec::new(),
        }
    }
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let model = &self.transport.config.generation_model;
        debug!(provider = PROVIDER, model = %model, prompt_len = prompt.len(), "generating answer");

        let request = GenerateContentRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: prompt }] }],
        };
        let response: GenerateContentResponse =
            self.transport.post(model, "generateContent", &request).await.map_err(|message| {
                error!(provider = PROVIDER, error = %message, "generation request failed");
                Self::failure(message)
            })?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            error!(provider = PROVIDER, "generation response carried no text");
            return Err(Self::failure("response contained no text"));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
