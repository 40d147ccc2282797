//! Configuration types for the acquisition pipeline.
//!
//! Everything a campaign needs is carried in one immutable [`CampaignConfig`]
//! passed at construction; there is no ambient or global state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The reagent being searched for. Immutable input to a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Reagent name as the user typed it (e.g., "Y-27632", "DMSO").
    pub target_name: String,

    /// Optional manufacturer to narrow the search.
    #[serde(default)]
    pub manufacturer: Option<String>,
}

impl Query {
    /// Create a query for a reagent name.
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            manufacturer: None,
        }
    }

    /// Narrow the query to one manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// The search term: target name, plus manufacturer when present.
    pub fn term(&self) -> String {
        match &self.manufacturer {
            Some(m) => format!("{} {}", self.target_name, m),
            None => self.target_name.clone(),
        }
    }
}

/// One known e-commerce site. Static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTarget {
    /// Human-readable name used in reports ("Funakoshi").
    pub display_name: String,

    /// Domain that search results must belong to ("funakoshi.co.jp").
    pub domain: String,
}

impl SiteTarget {
    pub fn new(display_name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            domain: domain.into(),
        }
    }
}

/// Configuration for one campaign run.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Sites to query.
    pub sites: Vec<SiteTarget>,

    /// Maximum candidate URLs kept per search (highest score first).
    pub max_candidates: usize,

    /// Candidate URLs to attempt per site before giving up.
    pub candidate_attempts: usize,

    /// Concurrent site workers. A deliberate throttle against provider
    /// rate limiting, not a performance knob.
    pub pool_size: usize,

    /// Minimum product-name similarity for a record to be kept.
    ///
    /// Empirically tuned default; no documented rationale for the exact
    /// value, so it stays configurable.
    pub similarity_threshold: f32,

    /// Wall-clock budget for one URL across the whole strategy chain.
    pub url_budget: Duration,

    /// Wall-clock budget for one site (search + all candidates).
    pub site_budget: Duration,

    /// Extraction retries after an empty or malformed response.
    pub extract_retries: usize,

    /// Fixed delay between extraction retries.
    pub extract_retry_delay: Duration,

    /// Page text is truncated to this many characters before extraction.
    pub max_page_chars: usize,

    /// Minimum spacing between requests to the same provider.
    pub provider_min_delay: Duration,

    /// Additional random delay on top of the minimum, so parallel workers
    /// don't fire in synchronized bursts.
    pub provider_jitter: Duration,

    /// Search result limit requested from the provider.
    pub search_limit: usize,

    /// Country code passed to the search provider.
    pub search_country: String,

    /// Language code passed to the search provider.
    pub search_language: String,

    /// When true, every candidate URL may contribute a record; by default a
    /// site stops at its first accepted record.
    pub exhaustive: bool,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            max_candidates: 10,
            candidate_attempts: 2,
            pool_size: 4,
            similarity_threshold: 0.5,
            url_budget: Duration::from_secs(30),
            site_budget: Duration::from_secs(120),
            extract_retries: 2,
            extract_retry_delay: Duration::from_secs(1),
            max_page_chars: 25_000,
            provider_min_delay: Duration::from_secs(1),
            provider_jitter: Duration::from_secs(4),
            search_limit: 10,
            search_country: "jp".to_string(),
            search_language: "ja".to_string(),
            exhaustive: false,
        }
    }
}

impl CampaignConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the site roster.
    pub fn with_sites(mut self, sites: Vec<SiteTarget>) -> Self {
        self.sites = sites;
        self
    }

    /// Set the worker pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the per-URL fetch budget.
    pub fn with_url_budget(mut self, budget: Duration) -> Self {
        self.url_budget = budget;
        self
    }

    /// Set the per-site budget.
    pub fn with_site_budget(mut self, budget: Duration) -> Self {
        self.site_budget = budget;
        self
    }

    /// Set candidate attempts per site.
    pub fn with_candidate_attempts(mut self, attempts: usize) -> Self {
        self.candidate_attempts = attempts;
        self
    }

    /// Allow multiple records per site.
    pub fn with_exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Worst-case campaign duration: `ceil(sites / pool) * site_budget`.
    pub fn worst_case_duration(&self) -> Duration {
        let batches = self.sites.len().div_ceil(self.pool_size.max(1)) as u32;
        self.site_budget * batches
    }
}

/// The default roster of reagent e-commerce sites.
pub fn default_sites() -> Vec<SiteTarget> {
    vec![
        SiteTarget::new("Cosmo Bio", "cosmobio.co.jp"),
        SiteTarget::new("Funakoshi", "funakoshi.co.jp"),
        SiteTarget::new("AXEL", "axel.as-1.co.jp"),
        SiteTarget::new("Selleck", "selleck.co.jp"),
        SiteTarget::new("MCE", "medchemexpress.com"),
        SiteTarget::new("Nacalai", "nacalai.co.jp"),
        SiteTarget::new("FUJIFILM Wako", "labchem-wako.fujifilm.com"),
        SiteTarget::new("Kanto Chemical", "kanto.co.jp"),
        SiteTarget::new("TCI", "tcichemicals.com"),
        SiteTarget::new("Merck", "sigmaaldrich.com"),
        SiteTarget::new("Wako Chemicals", "wako-chem.co.jp"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_term_includes_manufacturer() {
        let plain = Query::new("DMSO");
        assert_eq!(plain.term(), "DMSO");

        let narrowed = Query::new("DMSO").with_manufacturer("Sigma");
        assert_eq!(narrowed.term(), "DMSO Sigma");
    }

    #[test]
    fn test_default_config() {
        let config = CampaignConfig::default();
        assert_eq!(config.sites.len(), 11);
        assert_eq!(config.pool_size, 4);
        assert!((config.similarity_threshold - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_worst_case_duration() {
        let config = CampaignConfig::default()
            .with_pool_size(4)
            .with_site_budget(Duration::from_secs(100));
        // 11 sites / 4 workers -> 3 batches
        assert_eq!(config.worst_case_duration(), Duration::from_secs(300));
    }
}
