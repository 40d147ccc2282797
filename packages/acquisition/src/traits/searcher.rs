//! Search provider trait.
//!
//! The search provider is an opaque remote service: given a query string it
//! returns a page of result markup. The pipeline never interprets provider
//! failures beyond "no results" — a timeout or non-2xx advances the caller
//! to its next query variant.

use async_trait::async_trait;

use crate::error::SearchResult;

/// Remote web-search provider.
///
/// # Implementations
///
/// - `SerpSearcher` - SERP API over HTTP
/// - `MockSearcher` - For testing (see [`crate::testing`])
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web and return the raw result markup.
    ///
    /// The markup shape varies by provider; the URL extractor applies
    /// redundant patterns rather than assuming one shape.
    async fn search(&self, query: &str, limit: usize) -> SearchResult<String>;

    /// Provider name for logging and diagnostics.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: SearchProvider + ?Sized> SearchProvider for std::sync::Arc<T> {
    async fn search(&self, query: &str, limit: usize) -> SearchResult<String> {
        (**self).search(query, limit).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
