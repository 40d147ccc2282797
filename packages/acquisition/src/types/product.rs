//! Product and fetch data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A URL believed (not confirmed) to point at a product page.
///
/// Produced by the URL extractor, ranked by heuristic score. Lives for one
/// site-search attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUrl {
    /// Normalized URL: entity/percent decoded, query and fragment stripped.
    pub url: String,

    /// Heuristic score; higher is more likely a product page.
    pub score: i32,
}

impl CandidateUrl {
    pub fn new(url: impl Into<String>, score: i32) -> Self {
        Self {
            url: url.into(),
            score,
        }
    }
}

/// Raw page content returned by one fetch strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL the content was fetched from.
    pub url: String,

    /// Raw markup or rendered content.
    pub content: String,

    /// HTTP status, when the strategy saw one.
    pub http_status: Option<u16>,

    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            http_status: None,
            fetched_at: Utc::now(),
        }
    }

    /// Set the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn content_length(&self) -> usize {
        self.content.len()
    }
}

/// Outcome of running the whole strategy chain for one URL.
///
/// Exactly one of `page` / `error` is set. On failure the error is the
/// **last** one observed, since later strategies are simpler and more
/// diagnostic.
#[derive(Debug)]
pub struct FetchOutcome {
    /// URL the chain was run against.
    pub url: String,

    /// Accepted content, when some strategy produced it.
    pub page: Option<FetchedPage>,

    /// Name of the strategy that produced the accepted content.
    pub strategy: Option<String>,

    /// Last error observed when every strategy failed.
    pub error: Option<FetchError>,

    /// Strategies tried, in order, with the error each produced (empty
    /// string for the accepted attempt).
    pub attempts: Vec<StrategyAttempt>,
}

/// Outcome of one fetch-strategy attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Failed,
    Undersized,
    Blocked,
    Timeout,
}

/// Diagnostic record of one strategy attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub status: FetchStatus,
    pub detail: String,
    pub latency_ms: u64,
}

impl FetchOutcome {
    pub fn is_acceptable(&self) -> bool {
        self.page.is_some()
    }
}

/// One purchasable size/price/stock combination for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Pack size as shown on the page ("500mL", "5mg").
    pub size: String,

    /// Unit price, normalized to a plain non-negative number.
    pub price: f64,

    /// Whether the page reported the offer as in stock.
    pub in_stock: bool,
}

impl Offer {
    pub fn new(size: impl Into<String>, price: f64, in_stock: bool) -> Self {
        Self {
            size: size.into(),
            price,
            in_stock,
        }
    }
}

/// One extracted product with its purchasing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product name as extracted from the page.
    pub product_name: String,

    /// Model / catalog number, when the page showed one.
    pub model_number: Option<String>,

    /// Manufacturer, `"unknown"` when the page did not say.
    pub manufacturer: String,

    /// Purchasing options. A record with zero offers never enters a
    /// campaign result.
    pub offers: Vec<Offer>,

    /// Product page the record was extracted from.
    pub source_url: String,

    /// Display name of the site that contributed the record.
    pub source_site: String,

    /// Similarity of `product_name` to the query term.
    pub similarity: f32,
}

impl ProductRecord {
    pub fn has_offers(&self) -> bool {
        !self.offers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_page_builder() {
        let page = FetchedPage::new("https://example.com/item/1", "<html>x</html>").with_status(200);
        assert_eq!(page.http_status, Some(200));
        assert_eq!(page.content_length(), 14);
    }

    #[test]
    fn test_record_with_no_offers() {
        let record = ProductRecord {
            product_name: "DMSO".to_string(),
            model_number: None,
            manufacturer: "unknown".to_string(),
            offers: vec![],
            source_url: "https://example-chem.test/item/1".to_string(),
            source_site: "ExampleChem".to_string(),
            similarity: 1.0,
        };
        assert!(!record.has_offers());
    }
}
