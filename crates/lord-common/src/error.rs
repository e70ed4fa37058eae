//! Error types for LORD

use thiserror::Error;

/// Result type alias for LORD operations
pub type Result<T> = std::result::Result<T, LordError>;

/// Main error type for LORD
#[derive(Error, Debug)]
pub enum LordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),
}

impl LordError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
