//! Diagnostic event stream.
//!
//! The pipeline emits structured facts about what happened (site, phase,
//! outcome, latency) over a channel; presentation is an external subscriber
//! and never bleeds into the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::product::FetchStatus;

/// Events produced by the pipeline (facts about what happened).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    CampaignStarted {
        run_id: Uuid,
        target_name: String,
        sites: usize,
        started_at: DateTime<Utc>,
    },

    SiteStarted {
        run_id: Uuid,
        site: String,
    },

    SearchCompleted {
        run_id: Uuid,
        site: String,
        variant: usize,
        candidates: usize,
        latency_ms: u64,
    },

    FetchAttempted {
        run_id: Uuid,
        site: String,
        url: String,
        strategy: String,
        status: FetchStatus,
        latency_ms: u64,
    },

    ExtractionCompleted {
        run_id: Uuid,
        site: String,
        url: String,
        offers: usize,
        latency_ms: u64,
    },

    RecordFiltered {
        run_id: Uuid,
        site: String,
        product_name: String,
        similarity: f32,
    },

    SiteCompleted {
        run_id: Uuid,
        site: String,
        records: usize,
        latency_ms: u64,
    },

    CampaignCompleted {
        run_id: Uuid,
        sites_attempted: usize,
        sites_succeeded: usize,
        records: usize,
        records_filtered: usize,
        duration_ms: u64,
    },
}

/// Channel sender the pipeline emits events into.
///
/// Unbounded so a slow subscriber can never stall a site worker; a dropped
/// receiver silently discards events.
pub type EventSink = tokio::sync::mpsc::UnboundedSender<PipelineEvent>;

/// Send an event, ignoring a closed channel.
pub(crate) fn emit(sink: &Option<EventSink>, event: PipelineEvent) {
    if let Some(sink) = sink {
        let _ = sink.send(event);
    }
}
