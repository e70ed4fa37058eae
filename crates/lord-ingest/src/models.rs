//! RIDB response envelopes and related-resource names

use lord_common::Record;
use serde::{Deserialize, Serialize};

/// One RIDB response page.
///
/// Listing and related-resource endpoints share this envelope: records live in
/// `RECDATA`, paging counters under `METADATA.RESULTS`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPage {
    #[serde(rename = "RECDATA")]
    pub records: Option<Vec<Record>>,

    #[serde(rename = "METADATA", default)]
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMetadata {
    #[serde(rename = "RESULTS", default)]
    pub results: Option<PageResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResults {
    #[serde(rename = "CURRENT_COUNT")]
    pub current_count: Option<usize>,
}

impl RecordPage {
    /// Records on this page as reported by the upstream counter, falling back
    /// to the length of `RECDATA`
    pub fn current_count(&self) -> usize {
        self.metadata
            .as_ref()
            .and_then(|m| m.results.as_ref())
            .and_then(|r| r.current_count)
            .unwrap_or_else(|| self.records.as_ref().map_or(0, Vec::len))
    }
}

/// Sub-resources fetched once per facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RelatedResource {
    Activities,
    Campsites,
    Events,
}

impl RelatedResource {
    /// Path segment under `/facilities/{id}/`
    pub fn endpoint(self) -> &'static str {
        match self {
            RelatedResource::Activities => "activities",
            RelatedResource::Campsites => "campsites",
            RelatedResource::Events => "events",
        }
    }

    /// Key the collection is attached under in the snapshot
    pub fn attach_key(self) -> &'static str {
        match self {
            RelatedResource::Activities => "ACTIVITY",
            RelatedResource::Campsites => "CAMPSITE",
            RelatedResource::Events => "EVENT",
        }
    }
}

impl std::fmt::Display for RelatedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_listing_page() {
        let json = r#"{
            "RECDATA": [{"FacilityID": "1"}, {"FacilityID": "2"}],
            "METADATA": {"RESULTS": {"CURRENT_COUNT": 2, "TOTAL_COUNT": 950}}
        }"#;

        let page: RecordPage = serde_json::from_str(json).expect("should deserialise");

        assert_eq!(page.records.as_ref().map(Vec::len), Some(2));
        assert_eq!(page.current_count(), 2);
    }

    #[test]
    fn deserialise_page_without_recdata() {
        let page: RecordPage = serde_json::from_str(r#"{"METADATA": {}}"#).unwrap();
        assert!(page.records.is_none());
        assert_eq!(page.current_count(), 0);
    }

    #[test]
    fn current_count_falls_back_to_record_length() {
        let page: RecordPage =
            serde_json::from_str(r#"{"RECDATA": [{"CampsiteID": "7"}]}"#).unwrap();
        assert_eq!(page.current_count(), 1);
    }

    #[test]
    fn related_resource_names() {
        assert_eq!(RelatedResource::Campsites.endpoint(), "campsites");
        assert_eq!(RelatedResource::Campsites.attach_key(), "CAMPSITE");
        assert_eq!(RelatedResource::Activities.attach_key(), "ACTIVITY");
        assert_eq!(RelatedResource::Events.to_string(), "events");
    }
}
