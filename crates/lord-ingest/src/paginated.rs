//! Paginated listing fetcher
//!
//! Walks a RIDB listing endpoint once per partition (state code), page by
//! page, until the partition is exhausted or the global record cap is hit.
//! Upstream failures end the current partition only.

use crate::client::RidbClient;
use crate::throttle::PageThrottle;
use lord_common::record::{id_text, valid_id};
use lord_common::Record;
use std::collections::HashSet;
use tracing::{info, info_span, warn, Instrument};

/// What to list and how much of it
#[derive(Debug, Clone)]
pub struct ListingRequest {
    /// Listing endpoint, e.g. `facilities`
    pub endpoint: String,

    /// Extra query parameters; override the base query on key clashes
    pub params: Vec<(String, String)>,

    /// Upper bound on records across all partitions (None = unbounded)
    pub max_records: Option<usize>,

    /// Values sent as `state`, one paginated walk each
    pub partitions: Vec<String>,
}

impl ListingRequest {
    /// Facilities listing for Arizona, the upstream script's default
    pub fn facilities() -> Self {
        Self {
            endpoint: "facilities".to_string(),
            params: Vec::new(),
            max_records: None,
            partitions: vec!["AZ".to_string()],
        }
    }

    pub fn with_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partitions = partitions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }
}

/// Why a partition's walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back shorter than the page size
    Exhausted,
    /// The response had no `RECDATA` container
    NoData,
    /// The global record cap was reached
    Cap,
    /// A request failed; later pages of this partition were not attempted
    UpstreamError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    pub partition: String,
    pub requests: usize,
    pub records: usize,
    pub stop: StopReason,
}

/// Records from every partition, in fetch order, plus per-partition summaries
#[derive(Debug, Clone, Default)]
pub struct ListingResult {
    pub records: Vec<Record>,
    pub partitions: Vec<PartitionSummary>,
}

impl ListingResult {
    pub fn requests(&self) -> usize {
        self.partitions.iter().map(|p| p.requests).sum()
    }
}

/// Fetches listing pages with a fixed delay between requests
pub struct PaginatedFetcher<'a> {
    client: &'a RidbClient,
    throttle: PageThrottle,
}

impl<'a> PaginatedFetcher<'a> {
    pub fn new(client: &'a RidbClient) -> Self {
        let throttle = PageThrottle::new(client.config().page_delay());
        Self { client, throttle }
    }

    /// Walk every partition and collect the records.
    ///
    /// Records qualifying under several partitions appear once per partition;
    /// see [`dedupe_by_id`].
    pub async fn fetch(&mut self, request: &ListingRequest) -> ListingResult {
        let mut result = ListingResult::default();

        for partition in &request.partitions {
            let span = info_span!("partition", state = %partition);
            let summary = self
                .fetch_partition(request, partition, &mut result.records)
                .instrument(span)
                .await;
            result.partitions.push(summary);
        }

        info!(
            endpoint = %request.endpoint,
            records = result.records.len(),
            requests = result.requests(),
            "Listing fetch finished"
        );

        result
    }

    async fn fetch_partition(
        &mut self,
        request: &ListingRequest,
        partition: &str,
        records: &mut Vec<Record>,
    ) -> PartitionSummary {
        let page_size = self.client.config().page_size;
        let before = records.len();
        let mut requests = 0;
        let mut offset = 0;

        let stop = loop {
            if request.max_records.is_some_and(|cap| records.len() >= cap) {
                info!(max_records = ?request.max_records, "Reached maximum number of records");
                break StopReason::Cap;
            }

            self.throttle.wait().await;
            requests += 1;

            let query = self.page_query(request, partition, offset);
            let page = match self.client.fetch_page(&request.endpoint, &query).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(offset, error = %e, "Listing request failed, skipping rest of partition");
                    break StopReason::UpstreamError;
                },
            };

            let current_count = page.current_count();
            let Some(batch) = page.records else {
                info!(offset, "No RECDATA in response, ending partition");
                break StopReason::NoData;
            };

            // A short page ends the walk whether the counter or RECDATA says so
            let returned = batch.len();
            let room = request
                .max_records
                .map_or(usize::MAX, |cap| cap.saturating_sub(records.len()));
            records.extend(batch.into_iter().take(room));
            offset += page_size;

            info!(offset, returned, total = records.len(), "Fetched page");

            if returned < page_size || current_count < page_size {
                info!(offset, "No more records available, ending partition");
                break StopReason::Exhausted;
            }
        };

        PartitionSummary {
            partition: partition.to_string(),
            requests,
            records: records.len() - before,
            stop,
        }
    }

    fn page_query(
        &self,
        request: &ListingRequest,
        partition: &str,
        offset: usize,
    ) -> Vec<(String, String)> {
        let config = self.client.config();
        let mut query = vec![
            ("limit".to_string(), config.page_size.to_string()),
            ("offset".to_string(), offset.to_string()),
            ("state".to_string(), partition.to_string()),
        ];
        if let Some(activity) = &config.activity {
            query.push(("activity".to_string(), activity.clone()));
        }
        query.push(("full".to_string(), config.full.to_string()));

        let extra = config.extra_params.iter().chain(&request.params);
        for (key, value) in extra {
            match query.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => query.push((key.clone(), value.clone())),
            }
        }

        query
    }
}

/// Keep the first record seen per identifier.
///
/// Records without a valid identifier are kept as they are.
/// Returns the number of records removed.
pub fn dedupe_by_id(records: &mut Vec<Record>, key: &str) -> usize {
    let before = records.len();
    let mut seen = HashSet::new();
    records.retain(|record| match valid_id(record, key).and_then(id_text) {
        Some(id) => seen.insert(id),
        None => true,
    });
    before - records.len()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::RidbConfig;
    use serde_json::json;

    fn client(config: RidbConfig) -> RidbClient {
        RidbClient::new(config).unwrap()
    }

    #[test]
    fn test_page_query_base_parameters() {
        let client = client(RidbConfig::builder().api_key("k").build());
        let fetcher = PaginatedFetcher::new(&client);
        let query = fetcher.page_query(&ListingRequest::facilities(), "UT", 400);

        assert_eq!(
            query,
            vec![
                ("limit".to_string(), "200".to_string()),
                ("offset".to_string(), "400".to_string()),
                ("state".to_string(), "UT".to_string()),
                ("activity".to_string(), "Camping".to_string()),
                ("full".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_query_extra_params_override() {
        let client = client(
            RidbConfig::builder()
                .api_key("k")
                .activity(None)
                .extra_param("lastupdated", "10-01-2018")
                .build(),
        );
        let fetcher = PaginatedFetcher::new(&client);
        let request = ListingRequest::facilities()
            .with_params(vec![("full".to_string(), "false".to_string())]);
        let query = fetcher.page_query(&request, "AZ", 0);

        assert!(!query.iter().any(|(k, _)| k == "activity"));
        assert!(query.contains(&("full".to_string(), "false".to_string())));
        assert!(query.contains(&("lastupdated".to_string(), "10-01-2018".to_string())));
        assert_eq!(query.iter().filter(|(k, _)| k == "full").count(), 1);
    }

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let mut records: Vec<Record> = [
            json!({"FacilityID": "1", "from": "AZ"}),
            json!({"FacilityID": "2", "from": "AZ"}),
            json!({"FacilityID": "1", "from": "UT"}),
            json!({"FacilityName": "no id"}),
            json!({"FacilityName": "no id"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        let removed = dedupe_by_id(&mut records, "FacilityID");

        assert_eq!(removed, 1);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0]["from"], json!("AZ"));
    }
}
