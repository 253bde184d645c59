//! Seed records the [`DocumentStore`](crate::DocumentStore) is built from.

use serde::{Deserialize, Serialize};

use crate::document::{ClientId, Document, DocumentId};

/// One record of the seed corpus. Seeds never carry embeddings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedRecord {
    /// Unique identifier for the document.
    pub id: DocumentId,
    /// The owning client.
    pub client_id: ClientId,
    /// Free-form category label.
    pub category: String,
    /// The text content.
    pub content: String,
}

impl From<SeedRecord> for Document {
    fn from(seed: SeedRecord) -> Self {
        Document {
            id: seed.id,
            content: seed.content,
            client_id: seed.client_id,
            category: seed.category,
            embedding: None,
        }
    }
}

fn record(id: DocumentId, client_id: ClientId, category: &str, content: &str) -> SeedRecord {
    SeedRecord { id, client_id, category: category.to_string(), content: content.to_string() }
}

/// The five-document sample corpus.
///
/// Documents 1 and 2 are near-duplicates that belong to different clients:
/// vector similarity alone cannot tell them apart, the client filter can.
pub fn sample_corpus() -> Vec<SeedRecord> {
    vec![
        record(
            1,
            101,
            "Billing",
            "Your January invoice payment was processed successfully. Amount: $150.00.",
        ),
        record(
            2,
            102,
            "Billing",
            "Your January invoice payment failed. Please update your credit card.",
        ),
        record(
            3,
            101,
            "Technical Support",
            "Your ticket about slow internet was resolved. The modem was restarted remotely.",
        ),
        record(
            4,
            103,
            "Sales",
            "We are offering an upgrade to the Fiber 500MB plan at a special discount.",
        ),
        record(
            5,
            101,
            "Billing",
            "Confirmation of the refund for the improper charge last month.",
        ),
    ]
}
