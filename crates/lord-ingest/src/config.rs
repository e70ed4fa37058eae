//! RIDB client and pipeline configuration

use lord_common::{LordError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Public RIDB API root
pub const DEFAULT_BASE_URL: &str = "https://ridb.recreation.gov/api/v1";

/// Records requested per listing page
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Pause between listing requests
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1100;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Related-resource calls allowed per window
pub const DEFAULT_RELATED_CALLS_PER_WINDOW: u32 = 50;

pub const DEFAULT_RELATED_WINDOW_MS: u64 = 1000;

pub const DEFAULT_ACTIVITY: &str = "Camping";

pub const DEFAULT_SNAPSHOT_PATH: &str = "json_output/facilities_data.json";

pub const DEFAULT_CSV_DIR: &str = "csv_output";

/// Configuration for talking to RIDB and placing pipeline outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidbConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Value sent in the `apikey` header
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// Listing page size (`limit` query parameter)
    pub page_size: usize,

    /// Minimum gap between two listing requests, in milliseconds
    pub page_delay_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Related-resource calls allowed before the limiter sleeps
    pub related_calls_per_window: u32,

    /// Length of the related-resource limiter window, in milliseconds
    pub related_window_ms: u64,

    /// `activity` filter sent with listing requests (None = no filter)
    pub activity: Option<String>,

    /// `full` flag sent with listing requests
    pub full: bool,

    /// Extra listing parameters; these override the base query
    pub extra_params: Vec<(String, String)>,

    /// Where the enriched snapshot is written and read
    pub snapshot_path: PathBuf,

    /// Directory receiving the flat CSV tables
    pub csv_dir: PathBuf,
}

impl Default for RidbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            related_calls_per_window: DEFAULT_RELATED_CALLS_PER_WINDOW,
            related_window_ms: DEFAULT_RELATED_WINDOW_MS,
            activity: Some(DEFAULT_ACTIVITY.to_string()),
            full: true,
            extra_params: Vec::new(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
        }
    }
}

impl RidbConfig {
    pub fn builder() -> RidbConfigBuilder {
        RidbConfigBuilder::default()
    }

    /// Defaults overridden by `RIDB_API_KEY`, `RIDB_BASE_URL` and `RIDB_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("RIDB_API_KEY") {
            config.api_key = key;
        }

        if let Ok(url) = std::env::var("RIDB_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(secs) = std::env::var("RIDB_TIMEOUT_SECS") {
            config.timeout_secs = secs
                .parse()
                .map_err(|_| LordError::config(format!("RIDB_TIMEOUT_SECS is not a number: {}", secs)))?;
        }

        Ok(config)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn related_window(&self) -> Duration {
        Duration::from_millis(self.related_window_ms)
    }

    /// Listing endpoint URL, e.g. `{base}/facilities`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// Related-resource URL, e.g. `{base}/facilities/{id}/campsites`
    pub fn related_url(&self, facility_id: &str, resource: &str) -> String {
        format!(
            "{}/facilities/{}/{}",
            self.base_url.trim_end_matches('/'),
            facility_id,
            resource
        )
    }

    /// Check settings needed before talking to the upstream
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(LordError::config("Base URL cannot be empty"));
        }

        if self.api_key.trim().is_empty() {
            return Err(LordError::config(
                "RIDB API key is missing; set RIDB_API_KEY or pass --api-key",
            ));
        }

        if self.page_size == 0 {
            return Err(LordError::config("Page size must be greater than 0"));
        }

        if self.timeout_secs == 0 {
            return Err(LordError::config("Timeout must be greater than 0"));
        }

        if self.related_calls_per_window == 0 {
            return Err(LordError::config("Related call limit must be greater than 0"));
        }

        Ok(())
    }
}

/// Builder for RidbConfig
#[derive(Debug, Default)]
pub struct RidbConfigBuilder {
    config: RidbConfig,
}

impl RidbConfigBuilder {
    /// Start from an existing configuration instead of the defaults
    pub fn from_config(config: RidbConfig) -> Self {
        Self { config }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.config.page_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn related_limit(mut self, calls: u32, window: Duration) -> Self {
        self.config.related_calls_per_window = calls;
        self.config.related_window_ms = window.as_millis() as u64;
        self
    }

    pub fn activity(mut self, activity: Option<String>) -> Self {
        self.config.activity = activity;
        self
    }

    pub fn full(mut self, full: bool) -> Self {
        self.config.full = full;
        self
    }

    pub fn extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_params.push((key.into(), value.into()));
        self
    }

    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    pub fn csv_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.csv_dir = dir.into();
        self
    }

    pub fn build(self) -> RidbConfig {
        self.config
    }
}

/// Parse a `key=value` CLI argument
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
