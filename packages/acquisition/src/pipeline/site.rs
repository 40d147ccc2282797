//! Per-site orchestration.
//!
//! Drives one site through `Searching → Fetching → Extracting → Filtering`
//! and always lands on a terminal outcome: a record, or nothing plus
//! diagnostics. Every internal error is caught at the state boundary;
//! nothing a single site does can abort the campaign.

use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{emit, EventSink, PipelineEvent};
use crate::pacing::ProviderPacers;
use crate::pipeline::content::BlockDetector;
use crate::pipeline::extract::ProductExtractor;
use crate::pipeline::similarity::SimilarityFilter;
use crate::pipeline::urls::UrlExtractor;
use crate::strategies::chain::ContentFetcher;
use crate::traits::{model::StructuredModel, searcher::SearchProvider};
use crate::types::config::{CampaignConfig, Query, SiteTarget};
use crate::types::product::{CandidateUrl, FetchStatus, ProductRecord};
use crate::types::report::{Diagnostic, SiteOutcome, SitePhase};

/// One site's walk through the pipeline.
pub(crate) struct SiteRun<'a, S: ?Sized, M: ?Sized> {
    pub site: SiteTarget,
    pub query: &'a Query,
    pub searcher: &'a S,
    pub fetcher: &'a ContentFetcher,
    pub model: &'a M,
    pub config: &'a CampaignConfig,
    pub pacers: &'a ProviderPacers,
    pub events: &'a Option<EventSink>,
    pub run_id: Uuid,
}

impl<S, M> SiteRun<'_, S, M>
where
    S: SearchProvider + ?Sized,
    M: StructuredModel + ?Sized,
{
    /// Run to a terminal outcome. Never errors, never panics: budget
    /// overruns and cancellation both terminate as `Done(empty)`.
    pub async fn run(self, cancel: &CancellationToken) -> SiteOutcome {
        let started = Instant::now();
        emit(
            self.events,
            PipelineEvent::SiteStarted {
                run_id: self.run_id,
                site: self.site.display_name.clone(),
            },
        );

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                let mut outcome = SiteOutcome::empty(&self.site.display_name);
                outcome.diagnostics.push(Diagnostic::new(SitePhase::Searching, "cancelled"));
                outcome
            }
            result = tokio::time::timeout(self.config.site_budget, self.run_inner(cancel)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(site = %self.site.display_name, "site budget exhausted");
                        let mut outcome = SiteOutcome::empty(&self.site.display_name);
                        outcome.diagnostics.push(Diagnostic::new(
                            SitePhase::Fetching,
                            "site budget exhausted",
                        ));
                        outcome
                    }
                }
            }
        };

        info!(
            site = %self.site.display_name,
            records = outcome.records.len(),
            filtered = outcome.filtered,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "site completed"
        );
        emit(
            self.events,
            PipelineEvent::SiteCompleted {
                run_id: self.run_id,
                site: self.site.display_name.clone(),
                records: outcome.records.len(),
                latency_ms: started.elapsed().as_millis() as u64,
            },
        );
        outcome
    }

    async fn run_inner(&self, cancel: &CancellationToken) -> SiteOutcome {
        let mut outcome = SiteOutcome::empty(&self.site.display_name);

        // Searching
        let candidates = self.search_candidates(&mut outcome).await;
        if candidates.is_empty() {
            outcome.diagnostics.push(Diagnostic::new(
                SitePhase::Searching,
                "no candidate URLs from any query variant",
            ));
            return outcome;
        }

        // Fetching → Extracting → Filtering, advancing to the next-best
        // candidate on any recovered failure.
        let attempts = if self.config.exhaustive {
            candidates.len()
        } else {
            self.config.candidate_attempts.min(candidates.len())
        };

        for candidate in candidates.iter().take(attempts) {
            if cancel.is_cancelled() {
                outcome
                    .diagnostics
                    .push(Diagnostic::new(SitePhase::Fetching, "cancelled"));
                break;
            }

            if let Some(record) = self.try_candidate(candidate, &mut outcome, cancel).await {
                outcome.records.push(record);
                if !self.config.exhaustive {
                    break;
                }
            }
        }

        outcome
    }

    /// Try the query variants in priority order, stopping at the first one
    /// that yields at least one candidate.
    async fn search_candidates(&self, outcome: &mut SiteOutcome) -> Vec<CandidateUrl> {
        let url_extractor = UrlExtractor::new(self.config.max_candidates);

        for (index, variant) in self.query_variants().iter().enumerate() {
            self.pacers.search.pace().await;

            let started = Instant::now();
            let markup = match self
                .searcher
                .search(variant, self.config.search_limit)
                .await
            {
                Ok(markup) => markup,
                Err(e) => {
                    // Provider failure is "no results": try the next variant.
                    debug!(site = %self.site.display_name, variant = index, error = %e, "search failed");
                    outcome.diagnostics.push(Diagnostic::new(
                        SitePhase::Searching,
                        format!("variant {index}: {e}"),
                    ));
                    continue;
                }
            };

            let candidates = url_extractor.extract(&markup, &self.site.domain);
            emit(
                self.events,
                PipelineEvent::SearchCompleted {
                    run_id: self.run_id,
                    site: self.site.display_name.clone(),
                    variant: index,
                    candidates: candidates.len(),
                    latency_ms: started.elapsed().as_millis() as u64,
                },
            );

            if !candidates.is_empty() {
                return candidates;
            }
        }

        Vec::new()
    }

    /// Query phrasings in priority order: appending a price term often
    /// surfaces product pages more reliably, but some sites only index the
    /// bare name.
    fn query_variants(&self) -> Vec<String> {
        let term = self.query.term();
        let domain = &self.site.domain;
        vec![
            format!("{term} site:{domain}"),
            format!("{term} price site:{domain}"),
            format!("{term} 価格 site:{domain}"),
        ]
    }

    /// Fetch, extract, and filter one candidate URL. `None` on any
    /// recovered failure, with the reason appended to the outcome.
    async fn try_candidate(
        &self,
        candidate: &CandidateUrl,
        outcome: &mut SiteOutcome,
        cancel: &CancellationToken,
    ) -> Option<ProductRecord> {
        // Fetching
        self.pacers.fetch.pace().await;
        let fetched = self.fetcher.fetch(&candidate.url, cancel).await;

        for attempt in &fetched.attempts {
            emit(
                self.events,
                PipelineEvent::FetchAttempted {
                    run_id: self.run_id,
                    site: self.site.display_name.clone(),
                    url: candidate.url.clone(),
                    strategy: attempt.strategy.clone(),
                    status: attempt.status,
                    latency_ms: attempt.latency_ms,
                },
            );
        }

        let page = match fetched.page {
            Some(page) => page,
            None => {
                let detail = fetched
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "fetch failed".to_string());
                outcome
                    .diagnostics
                    .push(Diagnostic::new(SitePhase::Fetching, detail));
                return None;
            }
        };

        // A blocked or error page must never reach the extractor: it wastes
        // provider budget and can hallucinate on boilerplate.
        if BlockDetector::is_blocked(&page.content) {
            emit(
                self.events,
                PipelineEvent::FetchAttempted {
                    run_id: self.run_id,
                    site: self.site.display_name.clone(),
                    url: candidate.url.clone(),
                    strategy: fetched.strategy.clone().unwrap_or_default(),
                    status: FetchStatus::Blocked,
                    latency_ms: 0,
                },
            );
            outcome.diagnostics.push(Diagnostic::new(
                SitePhase::Fetching,
                format!("block page detected: {}", candidate.url),
            ));
            return None;
        }
        if BlockDetector::is_error_page(&page.content) {
            outcome.diagnostics.push(Diagnostic::new(
                SitePhase::Fetching,
                format!("error page detected: {}", candidate.url),
            ));
            return None;
        }

        // Extracting
        self.pacers.model.pace().await;
        let extractor = ProductExtractor::new(
            self.config.extract_retries,
            self.config.extract_retry_delay,
            self.config.max_page_chars,
        );

        let started = Instant::now();
        let product = match extractor
            .extract(self.model, &page.content, &self.query.target_name, cancel)
            .await
        {
            Ok(Some(product)) => product,
            Ok(None) => {
                outcome.diagnostics.push(Diagnostic::new(
                    SitePhase::Extracting,
                    format!("no product extracted: {}", candidate.url),
                ));
                return None;
            }
            Err(e) => {
                outcome
                    .diagnostics
                    .push(Diagnostic::new(SitePhase::Extracting, e.to_string()));
                return None;
            }
        };
        emit(
            self.events,
            PipelineEvent::ExtractionCompleted {
                run_id: self.run_id,
                site: self.site.display_name.clone(),
                url: candidate.url.clone(),
                offers: product.offers.len(),
                latency_ms: started.elapsed().as_millis() as u64,
            },
        );

        // Filtering
        let filter = SimilarityFilter::new(self.config.similarity_threshold);
        let (accepted, score) = filter.accept(&self.query.target_name, &product.product_name);
        if !accepted {
            debug!(
                site = %self.site.display_name,
                product = %product.product_name,
                score,
                "record rejected by similarity filter"
            );
            emit(
                self.events,
                PipelineEvent::RecordFiltered {
                    run_id: self.run_id,
                    site: self.site.display_name.clone(),
                    product_name: product.product_name.clone(),
                    similarity: score,
                },
            );
            outcome.filtered += 1;
            outcome.diagnostics.push(Diagnostic::new(
                SitePhase::Filtering,
                format!("similarity {score:.2} below threshold: {}", product.product_name),
            ));
            return None;
        }

        if product.offers.is_empty() {
            outcome.diagnostics.push(Diagnostic::new(
                SitePhase::Filtering,
                format!("no valid offers: {}", product.product_name),
            ));
            return None;
        }

        Some(ProductRecord {
            product_name: product.product_name,
            model_number: product.model_number,
            manufacturer: product.manufacturer,
            offers: product.offers,
            source_url: page.url,
            source_site: self.site.display_name.clone(),
            similarity: score,
        })
    }
}
