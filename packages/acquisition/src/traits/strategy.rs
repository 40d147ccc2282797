//! Fetch strategy trait.
//!
//! A strategy is one specific network-access method for retrieving a URL's
//! content: a managed browser gateway, a simple HTTP proxy, a direct client.
//! No single method is reliably best across bot-hostile sites, so the
//! content fetcher tries an ordered chain of them (see
//! [`crate::strategies::chain::ContentFetcher`]).

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchResult;
use crate::types::product::FetchedPage;

/// Default minimum content size a strategy will accept, in characters.
/// Anything smaller is a soft failure (error page, empty shell), not a
/// result.
pub const DEFAULT_MIN_CONTENT_LEN: usize = 500;

/// One network-access method for retrieving page content.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Strategy name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Time allowance for one attempt. The chain also enforces an overall
    /// per-URL budget, so a slow strategy cannot starve the rest.
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Minimum acceptable content size; smaller responses are treated as
    /// soft failures and the chain advances.
    fn min_content_len(&self) -> usize {
        DEFAULT_MIN_CONTENT_LEN
    }

    /// Fetch one URL.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}
