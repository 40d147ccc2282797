//! Campaign-level result types.

use serde::{Deserialize, Serialize};

use crate::types::product::{Offer, ProductRecord};

/// Phase of the per-site state machine, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SitePhase {
    Searching,
    Fetching,
    Extracting,
    Filtering,
}

/// One structured diagnostic entry from a site run.
///
/// Recovered failures (a dead strategy, a rejected candidate) end up here
/// instead of surfacing as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub phase: SitePhase,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(phase: SitePhase, detail: impl Into<String>) -> Self {
        Self {
            phase,
            detail: detail.into(),
        }
    }
}

/// Terminal outcome of one site orchestrator.
///
/// Always terminal, never an error: a site that fails entirely is
/// `records: []` plus diagnostics.
#[derive(Debug, Clone)]
pub struct SiteOutcome {
    /// Display name of the site.
    pub site: String,

    /// Accepted records; at most one unless the campaign is exhaustive.
    pub records: Vec<ProductRecord>,

    /// Records rejected by the similarity filter.
    pub filtered: usize,

    /// Recovered failures along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteOutcome {
    pub fn empty(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            records: Vec::new(),
            filtered: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Aggregated result of one campaign.
///
/// Record order reflects completion order, not input order; apply
/// [`CampaignResult::sort_by_site`] before presentation.
#[derive(Debug, Clone, Default)]
pub struct CampaignResult {
    pub records: Vec<ProductRecord>,

    /// Sites the campaign ran.
    pub sites_attempted: usize,

    /// Sites that contributed at least one record.
    pub sites_succeeded: usize,

    /// Records rejected by the similarity filter, across all sites.
    pub records_filtered: usize,

    /// Per-site diagnostics for sites that contributed nothing.
    pub diagnostics: Vec<(String, Vec<Diagnostic>)>,
}

/// One flattened output row, one per offer. The sole artifact handed to
/// presentation/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRow {
    pub product_name: String,
    pub site: String,
    pub model_number: String,
    pub manufacturer: String,
    pub size: String,
    pub price: f64,
    pub in_stock: bool,
    pub source_url: String,
}

impl CampaignResult {
    /// Stable secondary sort by site display name, then product name.
    pub fn sort_by_site(&mut self) {
        self.records
            .sort_by(|a, b| (a.source_site.as_str(), a.product_name.as_str())
                .cmp(&(b.source_site.as_str(), b.product_name.as_str())));
    }

    /// Flatten records into one row per offer.
    pub fn rows(&self) -> Vec<OfferRow> {
        self.records
            .iter()
            .flat_map(|record| {
                record.offers.iter().map(move |offer| OfferRow {
                    product_name: record.product_name.clone(),
                    site: record.source_site.clone(),
                    model_number: record.model_number.clone().unwrap_or_default(),
                    manufacturer: record.manufacturer.clone(),
                    size: offer.size.clone(),
                    price: offer.price,
                    in_stock: offer.in_stock,
                    source_url: record.source_url.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::ProductRecord;

    fn record(site: &str, name: &str, offers: Vec<Offer>) -> ProductRecord {
        ProductRecord {
            product_name: name.to_string(),
            model_number: Some("C-100".to_string()),
            manufacturer: "unknown".to_string(),
            offers,
            source_url: format!("https://{}.test/item", site),
            source_site: site.to_string(),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_rows_flatten_one_per_offer() {
        let result = CampaignResult {
            records: vec![record(
                "ExampleChem",
                "DMSO",
                vec![
                    Offer::new("500mL", 3000.0, true),
                    Offer::new("1L", 5500.0, false),
                ],
            )],
            sites_attempted: 1,
            sites_succeeded: 1,
            records_filtered: 0,
            diagnostics: vec![],
        };

        let rows = result.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].size, "500mL");
        assert_eq!(rows[1].price, 5500.0);
        assert_eq!(rows[0].site, "ExampleChem");
    }

    #[test]
    fn test_sort_by_site_is_stable_secondary_order() {
        let mut result = CampaignResult {
            records: vec![
                record("Zeta", "DMSO", vec![Offer::new("1L", 1.0, true)]),
                record("Alpha", "DMSO", vec![Offer::new("1L", 1.0, true)]),
            ],
            ..Default::default()
        };
        result.sort_by_site();
        assert_eq!(result.records[0].source_site, "Alpha");
        assert_eq!(result.records[1].source_site, "Zeta");
    }
}
