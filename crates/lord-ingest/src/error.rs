//! Error types for the ingestion pipeline
//!
//! Upstream failures never escape the fetchers: they are logged and degrade to
//! an empty unit of work. These variants surface local problems (files,
//! configuration) and the per-request failures the fetchers report before
//! swallowing them.

use lord_common::LordError;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Network failure, timeout, or client construction failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Upstream body was not the expected JSON document
    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] LordError),
}

impl IngestError {
    /// Upstream failures that degrade to an empty result instead of failing the run
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            IngestError::Http(_) | IngestError::Status { .. } | IngestError::Decode { .. }
        )
    }
}
