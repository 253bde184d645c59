//! Context assembly and prompt rendering for the answer generator.

use crate::document::ScoredDocument;

/// Build the generation context: one `- [ID:<id>] <content>` line per document,
/// in the order given.
pub fn build_context<'a>(documents: impl IntoIterator<Item = &'a ScoredDocument>) -> String {
    documents
        .into_iter()
        .map(|d| format!("- [ID:{}] {}", d.document.id, d.document.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `template`, substituting `{context}` and `{query}`.
///
/// Only the template is expanded: placeholder text inside the context or the
/// query is inserted verbatim.
pub fn render_prompt(template: &str, context: &str, query: &str) -> String {
    template
        .split("{query}")
        .map(|part| part.replace("{context}", context))
        .collect::<Vec<_>>()
        .join(query)
}
