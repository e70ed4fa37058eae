//! Per-facility related-record fetcher

use crate::client::RidbClient;
use crate::models::RelatedResource;
use crate::throttle::FixedWindowLimiter;
use lord_common::Record;
use tracing::{debug, error, warn};

/// Fetches one related collection per call, behind a fixed-window limiter.
///
/// Failures are logged and yield an empty collection so one bad facility never
/// aborts the batch.
pub struct RelatedRecordFetcher<'a> {
    client: &'a RidbClient,
    limiter: FixedWindowLimiter,
    failures: usize,
}

impl<'a> RelatedRecordFetcher<'a> {
    pub fn new(client: &'a RidbClient) -> Self {
        let config = client.config();
        let limiter =
            FixedWindowLimiter::new(config.related_calls_per_window, config.related_window());
        Self {
            client,
            limiter,
            failures: 0,
        }
    }

    pub async fn fetch(&mut self, facility_id: &str, resource: RelatedResource) -> Vec<Record> {
        self.limiter.acquire().await;

        match self.client.fetch_related(facility_id, resource).await {
            Ok(page) => {
                let records = page.records.unwrap_or_default();
                debug!(facility_id, %resource, count = records.len(), "Fetched related records");
                records
            },
            Err(e) if e.is_upstream() => {
                self.failures += 1;
                warn!(facility_id, %resource, error = %e, "Related-record request failed");
                Vec::new()
            },
            Err(e) => {
                self.failures += 1;
                error!(facility_id, %resource, error = %e, "Related-record fetch failed locally");
                Vec::new()
            },
        }
    }

    /// Calls that degraded to an empty collection so far
    pub fn failures(&self) -> usize {
        self.failures
    }
}
