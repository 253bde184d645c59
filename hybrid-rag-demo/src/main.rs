//! # Hybrid Retrieval Demo
//!
//! Indexes the five-document sample corpus, runs one hybrid query and prints
//! every scored document together with the answer.
//!
//! ```bash
//! # Gemini (needs GOOGLE_API_KEY, GEMINI_API_KEY or API_KEY; a .env file works too)
//! cargo run -p hybrid-rag-demo -- --query "What is the status of my payment?" --client-id 101
//!
//! # No network, no API key: keyword embeddings and an echoing generator
//! cargo run -p hybrid-rag-demo -- --offline
//! ```

mod offline;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hybrid_rag::{
    AnswerGenerator, DocumentStore, EmbeddingProvider, GeminiConfig, GeminiEmbeddingProvider,
    GeminiGenerator, HybridRetriever, RagError, RetrievalConfig, RetrievalRequest,
    RetrievalState, ScoredDocument,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::offline::{EchoGenerator, KeywordEmbedder};

/// Hybrid retrieval demo: vector similarity AND a client filter.
#[derive(Parser)]
#[command(name = "hybrid-rag-demo", version, about)]
struct Cli {
    /// Question to answer
    #[arg(short, long, default_value = "What is the status of my payment?")]
    query: String,

    /// Only documents of this client can be used as context
    #[arg(short, long, default_value_t = 101)]
    client_id: i64,

    /// Similarity a document must exceed to be relevant
    #[arg(long, default_value_t = hybrid_rag::DEFAULT_SIMILARITY_THRESHOLD)]
    threshold: f32,

    /// Deadline for each embedding and generation call, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pause between indexing calls in milliseconds (default 500, 0 offline)
    #[arg(long)]
    index_delay_ms: Option<u64>,

    /// Use local keyword embeddings and an echoing generator instead of Gemini
    #[arg(long)]
    offline: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "hybrid_rag=debug,info" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let (embedder, generator) = collaborators(cli.offline)?;
    let default_delay = if cli.offline { 0 } else { 500 };
    let mut config = RetrievalConfig::builder()
        .similarity_threshold(cli.threshold)
        .index_delay(Duration::from_millis(cli.index_delay_ms.unwrap_or(default_delay)));
    if let Some(secs) = cli.timeout_secs {
        config = config.request_timeout(Duration::from_secs(secs));
    }

    let retriever = HybridRetriever::builder()
        .config(config.build()?)
        .store(Arc::new(DocumentStore::with_sample_corpus()))
        .embedding_provider(embedder)
        .generator(generator)
        .observer(Arc::new(|state: RetrievalState| info!(%state, "retrieval state")))
        .build()?;

    println!("Indexing {} documents...", hybrid_rag::sample_corpus().len());
    let report = retriever.index(|progress| println!("  {progress}")).await?;
    if !report.is_complete() {
        anyhow::bail!("documents {:?} could not be indexed", report.failed);
    }

    println!("\nQuery: \"{}\" (client {})", cli.query, cli.client_id);
    let request = RetrievalRequest::new(&cli.query, cli.client_id);
    match retriever.retrieve(&request).await {
        Ok(result) => {
            print_scores(&result.documents, result.similarity_threshold);
            println!("\nAnswer:\n{}", result.answer);
            Ok(())
        }
        Err(RagError::GenerationError { provider, message, documents }) => {
            print_scores(&documents, retriever.config().similarity_threshold);
            anyhow::bail!("answer generation failed ({provider}): {message}")
        }
        Err(e) => Err(e.into()),
    }
}

type Collaborators = (Arc<dyn EmbeddingProvider>, Arc<dyn AnswerGenerator>);

fn collaborators(offline: bool) -> Result<Collaborators> {
    if offline {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);
        let generator: Arc<dyn AnswerGenerator> = Arc::new(EchoGenerator);
        return Ok((embedder, generator));
    }

    let config = GeminiConfig::from_env();
    if config.api_key.is_none() {
        anyhow::bail!(
            "GOOGLE_API_KEY, GEMINI_API_KEY or API_KEY must be set (or pass --offline).\n\
             Get a key at https://aistudio.google.com/apikey"
        );
    }
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(GeminiEmbeddingProvider::new(config.clone())?);
    let generator: Arc<dyn AnswerGenerator> = Arc::new(GeminiGenerator::new(config)?);
    Ok((embedder, generator))
}

fn print_scores(documents: &[ScoredDocument], threshold: f32) {
    println!(
        "\n{:>4}  {:>6}  {:>10}  {:>6}  {:>8}  content",
        "id", "client", "similarity", "filter", "relevant"
    );
    for scored in documents {
        let doc = &scored.document;
        let mut content: String = doc.content.chars().take(48).collect();
        if doc.content.chars().count() > 48 {
            content.push_str("...");
        }
        println!(
            "{:>4}  {:>6}  {:>10.4}  {:>6}  {:>8}  {content}",
            doc.id,
            doc.client_id,
            scored.similarity,
            if scored.passed_filter { "pass" } else { "-" },
            if scored.is_relevant(threshold) { "yes" } else { "-" },
        );
    }
}
