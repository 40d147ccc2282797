//! Typed errors for the acquisition pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. The taxonomy mirrors the
//! recovery rules: search and fetch errors are recovered locally by advancing
//! to the next variant/strategy/candidate, extraction errors consume retry
//! attempts, and only configuration problems are fatal to a campaign.

use thiserror::Error;

/// Errors from the search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed
    #[error("search HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider returned a non-success status
    #[error("search provider returned HTTP {status}")]
    Status { status: u16 },

    /// Request timed out
    #[error("search timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors from a single fetch-strategy attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failure (connect, TLS, body read)
    #[error("fetch HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-2xx response with nothing usable in the body
    #[error("fetch returned HTTP {status}")]
    Status { status: u16 },

    /// Strategy exceeded its time allowance
    #[error("fetch timed out: {url}")]
    Timeout { url: String },

    /// Content came back smaller than the strategy's acceptance threshold
    #[error("content too small: {len} chars (minimum {min})")]
    Undersized { len: usize, min: usize },

    /// URL could not be parsed or targeted
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Per-URL wall-clock budget exhausted before any strategy succeeded
    #[error("fetch budget exhausted: {url}")]
    BudgetExhausted { url: String },
}

/// Errors from the structured-extraction provider.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Provider transport failure
    #[error("extraction provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider returned a non-success status
    #[error("extraction provider returned HTTP {status}")]
    Status { status: u16 },

    /// Request timed out
    #[error("extraction timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Response was not parseable JSON after retries were exhausted
    #[error("malformed extraction response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Response JSON did not match the required shape
    #[error("extraction response missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Top-level pipeline errors.
///
/// Per-site failures never surface here; a site that fails entirely
/// terminates as `Done(empty)` with diagnostics. Only configuration
/// problems and cancellation abort a campaign.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Invalid or missing configuration, detected before any site task starts
    #[error("config error: {reason}")]
    Config { reason: String },

    /// Missing or invalid provider credentials
    #[error("missing credential: {name}")]
    MissingCredential { name: &'static str },

    /// Campaign was cancelled
    #[error("campaign cancelled")]
    Cancelled,
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
