//! Campaign orchestration.
//!
//! Fans the per-site pipeline out across every configured site with a
//! bounded worker pool and aggregates whatever comes back. The pool size is
//! a deliberate throttle: unbounded concurrency trips rate limiting on the
//! shared search and fetch providers.

use futures::stream::{self, StreamExt};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::events::{emit, EventSink, PipelineEvent};
use crate::pacing::ProviderPacers;
use crate::pipeline::site::SiteRun;
use crate::strategies::chain::ContentFetcher;
use crate::traits::{model::StructuredModel, searcher::SearchProvider};
use crate::types::config::{CampaignConfig, Query};
use crate::types::report::CampaignResult;

/// One end-to-end run of the pipeline for a single query across all
/// configured sites.
pub struct Campaign<S, M> {
    searcher: S,
    fetcher: ContentFetcher,
    model: M,
    config: CampaignConfig,
    pacers: ProviderPacers,
    events: Option<EventSink>,
}

impl<S, M> Campaign<S, M>
where
    S: SearchProvider,
    M: StructuredModel,
{
    /// Build a campaign over explicit collaborators and an immutable
    /// configuration.
    pub fn new(searcher: S, fetcher: ContentFetcher, model: M, config: CampaignConfig) -> Self {
        let pacers = ProviderPacers::new(config.provider_min_delay, config.provider_jitter);
        Self {
            searcher,
            fetcher,
            model,
            config,
            pacers,
            events: None,
        }
    }

    /// Subscribe a diagnostic-event channel.
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = Some(events);
        self
    }

    /// Run the campaign to completion.
    ///
    /// Always completes within `config.worst_case_duration()`; per-site
    /// failures surface as diagnostics, never as errors. The only error
    /// paths are invalid configuration and cancellation.
    pub async fn run(&self, query: &Query, cancel: &CancellationToken) -> Result<CampaignResult> {
        if self.config.sites.is_empty() {
            return Err(PipelineError::Config {
                reason: "no sites configured".to_string(),
            });
        }
        if self.config.pool_size == 0 {
            return Err(PipelineError::Config {
                reason: "pool_size must be at least 1".to_string(),
            });
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            %run_id,
            query = %query.target_name,
            sites = self.config.sites.len(),
            pool = self.config.pool_size,
            "campaign started"
        );
        emit(
            &self.events,
            PipelineEvent::CampaignStarted {
                run_id,
                target_name: query.target_name.clone(),
                sites: self.config.sites.len(),
                started_at: chrono::Utc::now(),
            },
        );

        let outcomes = stream::iter(self.config.sites.clone())
            .map(|site| {
                let run = SiteRun {
                    site,
                    query,
                    searcher: &self.searcher,
                    fetcher: &self.fetcher,
                    model: &self.model,
                    config: &self.config,
                    pacers: &self.pacers,
                    events: &self.events,
                    run_id,
                };
                run.run(cancel)
            })
            .buffer_unordered(self.config.pool_size);

        // Single-writer merge: each outcome lands here only after its site
        // task fully completed. Order is completion order.
        let mut result = CampaignResult {
            sites_attempted: self.config.sites.len(),
            ..Default::default()
        };

        futures::pin_mut!(outcomes);
        while let Some(outcome) = outcomes.next().await {
            if outcome.succeeded() {
                result.sites_succeeded += 1;
            } else {
                result
                    .diagnostics
                    .push((outcome.site.clone(), outcome.diagnostics.clone()));
            }
            result.records_filtered += outcome.filtered;
            result.records.extend(outcome.records);
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            %run_id,
            records = result.records.len(),
            succeeded = result.sites_succeeded,
            attempted = result.sites_attempted,
            filtered = result.records_filtered,
            duration_ms,
            "campaign completed"
        );
        emit(
            &self.events,
            PipelineEvent::CampaignCompleted {
                run_id,
                sites_attempted: result.sites_attempted,
                sites_succeeded: result.sites_succeeded,
                records: result.records.len(),
                records_filtered: result.records_filtered,
                duration_ms,
            },
        );

        Ok(result)
    }
}
