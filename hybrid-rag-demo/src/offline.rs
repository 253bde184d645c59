//! Local stand-ins for the Gemini collaborators, used with `--offline`.

use async_trait::async_trait;
use hybrid_rag::{AnswerGenerator, EmbeddingProvider, Result};

/// Each axis of the embedding counts the words of one topic.
const TOPICS: &[&[&str]] = &[
    &["payment", "invoice", "charge", "refund", "billing", "amount"],
    &["internet", "modem", "ticket", "slow", "connection"],
    &["fiber", "plan", "upgrade", "discount", "offer", "offering"],
    &["failed", "card", "credit", "declined"],
    &["processed", "successfully", "confirmation", "resolved", "status"],
];

/// Bag-of-topics embeddings: deterministic and good enough to tell the
/// sample corpus apart.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; TOPICS.len()];
        let lower = text.to_lowercase();
        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            for (axis, topic) in TOPICS.iter().enumerate() {
                if topic.contains(&word) {
                    vector[axis] += 1.0;
                }
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        TOPICS.len()
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Answers by listing the context lines it was given.
pub struct EchoGenerator;

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let context: Vec<&str> =
            prompt.lines().filter(|line| line.starts_with("- [ID:")).collect();
        Ok(format!(
            "(offline) Based on {} relevant document(s):\n{}",
            context.len(),
            context.join("\n")
        ))
    }

    fn name(&self) -> &str {
        "echo"
    }
}
