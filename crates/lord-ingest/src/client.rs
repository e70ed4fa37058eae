//! HTTP client for the RIDB API
//!
//! Thin wrapper over `reqwest` that knows the RIDB headers, URL layout, and
//! response envelope. Pacing lives in the fetchers, not here.

use crate::config::RidbConfig;
use crate::error::{IngestError, Result};
use crate::models::{RecordPage, RelatedResource};
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

const USER_AGENT: &str = concat!("LORD-Ingest/", env!("CARGO_PKG_VERSION"));

/// Client for RIDB listing and related-resource endpoints
#[derive(Debug, Clone)]
pub struct RidbClient {
    http: Client,
    config: RidbConfig,
}

impl RidbClient {
    /// Create a client; the configuration is validated first
    pub fn new(config: RidbConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RidbConfig {
        &self.config
    }

    /// Fetch one page of a listing endpoint such as `facilities`
    pub async fn fetch_page(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<RecordPage> {
        let url = self.config.endpoint_url(endpoint);
        self.get_page(&url, query).await
    }

    /// Fetch the full related collection for one facility
    pub async fn fetch_related(
        &self,
        facility_id: &str,
        resource: RelatedResource,
    ) -> Result<RecordPage> {
        let url = self.config.related_url(facility_id, resource.endpoint());
        self.get_page(&url, &[]).await
    }

    async fn get_page(&self, url: &str, query: &[(String, String)]) -> Result<RecordPage> {
        debug!(url, ?query, "GET");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header("apikey", &self.config.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| IngestError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
