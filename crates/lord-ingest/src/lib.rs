//! LORD Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pulls recreation facilities from the RIDB API, enriches each facility with
//! its related collections, persists the result as a JSON snapshot, and
//! flattens the snapshot into CSV tables.
//!
//! # Pipeline
//!
//! - [`paginated`]: offset-paginated listing per state, with a fixed pause
//!   between requests
//! - [`related`]: per-facility related collections behind a fixed-window limiter
//! - [`orchestrator`]: runs both and builds the [`Snapshot`]
//! - [`normalize`]: snapshot to flat tables
//! - [`export`]: flat tables to CSV files
//!
//! # Example
//!
//! ```no_run
//! use lord_ingest::{IngestionOrchestrator, ListingRequest, RidbClient, RidbConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RidbConfig::from_env()?;
//!     let snapshot_path = config.snapshot_path.clone();
//!     let orchestrator = IngestionOrchestrator::new(RidbClient::new(config)?);
//!
//!     let request = ListingRequest::facilities().with_partitions(["AZ", "UT"]);
//!     let (snapshot, _report) = orchestrator.ingest(&request).await;
//!     snapshot.write(&snapshot_path)?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod paginated;
pub mod related;
pub mod snapshot;
pub mod throttle;

pub use client::RidbClient;
pub use config::{RidbConfig, RidbConfigBuilder};
pub use error::{IngestError, Result};
pub use export::CsvExporter;
pub use models::RelatedResource;
pub use normalize::{NormalizeOptions, NormalizedTables, Normalizer};
pub use orchestrator::{IngestReport, IngestionOrchestrator};
pub use paginated::{ListingRequest, PaginatedFetcher, StopReason};
pub use related::RelatedRecordFetcher;
pub use snapshot::Snapshot;
