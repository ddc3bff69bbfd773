//! Generation provider trait for producing answers from retrieved context.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A language model that answers a question given retrieved context.
///
/// Implementations own their prompt format; callers hand over the raw
/// question and the records returned by retrieval, best match first.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produce an answer to `question` conditioned on `context`.
    async fn generate(&self, question: &str, context: &[SearchResult]) -> Result<String>;

    /// The model identifier this provider generates with.
    fn model_name(&self) -> &str;
}

/// Render retrieved records as a numbered context block.
///
/// Shared by providers that send a single plain-text prompt.
pub fn render_context(context: &[SearchResult]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, result)| format!("[{}] {}", i + 1, result.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
