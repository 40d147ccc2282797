//! Multi-Site Reagent Offer Acquisition
//!
//! A best-effort pipeline that locates commercial offers (price, pack size,
//! stock status) for a named chemical reagent across a fixed set of
//! e-commerce sites: web search, page fetch through an ordered chain of
//! access strategies, and structured extraction through a language model,
//! aggregated into a flat offer table.
//!
//! # Design Philosophy
//!
//! **Tolerate everything, abort nothing**
//!
//! - Remote sites are unreliable, bot-hostile, and rate-limited; every
//!   failure is recovered locally (next strategy, next query variant, next
//!   candidate URL) and a single site's total failure never aborts a
//!   campaign
//! - Bounded time, bounded concurrency: each site and each URL carries its
//!   own wall-clock budget, and the worker pool doubles as a throttle
//! - No state across runs; one campaign is one batch
//!
//! # Usage
//!
//! ```rust,ignore
//! use acquisition::{Campaign, CampaignConfig, ContentFetcher, Query};
//! use acquisition::providers::{GeminiModel, SerpSearcher};
//! use acquisition::security::Credentials;
//! use acquisition::strategies::DirectStrategy;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let creds = Credentials::from_env()?;
//! let config = CampaignConfig::default();
//!
//! let fetcher = ContentFetcher::new(
//!     vec![Arc::new(DirectStrategy::new()?)],
//!     config.url_budget,
//! );
//! let campaign = Campaign::new(
//!     SerpSearcher::new(creds.search_api_key.clone()),
//!     fetcher,
//!     GeminiModel::new(creds.model_api_key.clone()),
//!     config,
//! );
//!
//! let result = campaign
//!     .run(&Query::new("Y-27632"), &CancellationToken::new())
//!     .await?;
//! for row in result.rows() {
//!     println!("{} / {} / {} / ¥{}", row.product_name, row.site, row.size, row.price);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Provider abstractions (search, fetch strategies, model)
//! - [`types`] - Configuration, products, reports
//! - [`pipeline`] - The pipeline stages and orchestrators
//! - [`strategies`] - Fetch strategy implementations and the fallback chain
//! - [`providers`] - SERP and Gemini clients
//! - [`security`] - Credential handling
//! - [`testing`] - Mock providers for tests

pub mod backoff;
pub mod error;
pub mod events;
pub mod pacing;
pub mod pipeline;
pub mod providers;
pub mod security;
pub mod strategies;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractError, FetchError, PipelineError, SearchError};
pub use events::{EventSink, PipelineEvent};
pub use pipeline::{Campaign, BlockDetector, ProductExtractor, SimilarityFilter, UrlExtractor};
pub use strategies::ContentFetcher;
pub use traits::{model::StructuredModel, searcher::SearchProvider, strategy::FetchStrategy};
pub use types::{
    config::{default_sites, CampaignConfig, Query, SiteTarget},
    product::{CandidateUrl, FetchOutcome, FetchStatus, FetchedPage, Offer, ProductRecord},
    report::{CampaignResult, Diagnostic, OfferRow, SiteOutcome, SitePhase},
};
