//! Ingestion orchestrator
//!
//! Sequence of one run:
//! 1. List facilities across all partitions ([`PaginatedFetcher`])
//! 2. For each facility with a valid `FacilityID`, fetch every configured
//!    related collection ([`RelatedRecordFetcher`]) and attach it
//! 3. Return the enriched list as a [`Snapshot`]
//!
//! Everything runs on one task, one request at a time; both rate limiters
//! assume serialized calls.

use crate::client::RidbClient;
use crate::models::RelatedResource;
use crate::paginated::{dedupe_by_id, ListingRequest, PaginatedFetcher, PartitionSummary};
use crate::related::RelatedRecordFetcher;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use lord_common::record::{id_text, valid_id, FACILITY_ID};
use serde_json::Value;
use tracing::{info, info_span, Instrument};

/// Counters describing one ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub partitions: Vec<PartitionSummary>,
    pub facilities: usize,
    pub duplicates_removed: usize,
    /// Facilities that received related collections
    pub enriched: usize,
    /// Facilities left untouched because they had no usable identifier
    pub skipped_without_id: usize,
    /// Related calls that failed and were attached as empty collections
    pub related_failures: usize,
}

impl IngestReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drives both fetchers and produces the snapshot
pub struct IngestionOrchestrator {
    client: RidbClient,
    related: Vec<RelatedResource>,
    dedupe: bool,
    show_progress: bool,
}

impl IngestionOrchestrator {
    /// Orchestrator attaching campsites, without deduplication
    pub fn new(client: RidbClient) -> Self {
        Self {
            client,
            related: vec![RelatedResource::Campsites],
            dedupe: false,
            show_progress: false,
        }
    }

    pub fn with_related(mut self, related: Vec<RelatedResource>) -> Self {
        self.related = related;
        self
    }

    /// Keep only the first record per `FacilityID` across partitions
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Draw a progress bar over the related-record loop
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fetch and enrich; never fails, upstream problems shrink the result instead
    pub async fn ingest(&self, request: &ListingRequest) -> (Snapshot, IngestReport) {
        let started_at = Utc::now();

        let listing = PaginatedFetcher::new(&self.client)
            .fetch(request)
            .instrument(info_span!("listing", endpoint = %request.endpoint))
            .await;
        let mut facilities = listing.records;

        let duplicates_removed = if self.dedupe {
            let removed = dedupe_by_id(&mut facilities, FACILITY_ID);
            info!(removed, "Removed duplicate facilities");
            removed
        } else {
            0
        };

        let mut related = RelatedRecordFetcher::new(&self.client);
        let progress = self.progress_bar(facilities.len() as u64);
        let mut enriched = 0;
        let mut skipped_without_id = 0;

        info!(facilities = facilities.len(), related = ?self.related, "Fetching related data");

        for facility in facilities.iter_mut() {
            progress.inc(1);

            let Some(facility_id) = valid_id(facility, FACILITY_ID).and_then(id_text) else {
                skipped_without_id += 1;
                continue;
            };
            progress.set_message(facility_id.clone());

            for &resource in &self.related {
                let records = related.fetch(&facility_id, resource).await;
                let collection = records.into_iter().map(Value::Object).collect();
                facility.insert(resource.attach_key().to_string(), Value::Array(collection));
            }
            enriched += 1;
        }
        progress.finish_and_clear();

        let report = IngestReport {
            started_at,
            finished_at: Utc::now(),
            partitions: listing.partitions,
            facilities: facilities.len(),
            duplicates_removed,
            enriched,
            skipped_without_id,
            related_failures: related.failures(),
        };

        info!(
            facilities = report.facilities,
            enriched = report.enriched,
            skipped_without_id = report.skipped_without_id,
            related_failures = report.related_failures,
            elapsed_secs = report.elapsed().num_seconds(),
            "Ingestion finished"
        );

        (Snapshot::new(facilities), report)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} facility {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(len).with_style(style)
    }
}
