//! LORD Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the LORD workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`LordError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup shared by every binary
//! - **Records**: helpers over the dynamic JSON objects returned by RIDB
//!
//! # Example
//!
//! ```no_run
//! use lord_common::record::{valid_id, Record};
//!
//! fn facility_key(record: &Record) -> Option<String> {
//!     valid_id(record, "FacilityID").and_then(lord_common::record::id_text)
//! }
//! ```

pub mod error;
pub mod logging;
pub mod record;

// Re-export commonly used types
pub use error::{LordError, Result};
pub use record::Record;
