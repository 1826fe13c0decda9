//! Error types for the Arsenal core library.
//!
//! The decision path never fails: scoring, caching and selection degrade to
//! "no decision this cycle". Errors only surface at the configuration and
//! snapshot boundaries.

use thiserror::Error;

/// Top-level error type for all Arsenal operations that can fail.
#[derive(Error, Debug)]
pub enum ArsenalError {
    /// The configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration parsed but holds values the engine cannot use.
    #[error("Invalid configuration: {field} ({reason})")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ArsenalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ArsenalError>;
