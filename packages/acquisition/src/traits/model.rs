//! Structured-extraction provider trait.

use async_trait::async_trait;

use crate::error::ExtractResult;

/// Remote language model used for structured extraction.
///
/// Implementations wrap a specific provider (Gemini, OpenAI, ...) and return
/// the raw text of the model's response; prompt construction and response
/// parsing belong to [`crate::pipeline::extract`], so the same contract works
/// against any provider.
#[async_trait]
pub trait StructuredModel: Send + Sync {
    /// Run one generation request and return the response text.
    async fn generate_structured(&self, prompt: &str) -> ExtractResult<String>;

    /// Provider name for logging and diagnostics.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: StructuredModel + ?Sized> StructuredModel for std::sync::Arc<T> {
    async fn generate_structured(&self, prompt: &str) -> ExtractResult<String> {
        (**self).generate_structured(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
