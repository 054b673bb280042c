//! Error types for reparto-core.

use thiserror::Error;

/// Result type for reparto operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by every reparto crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The linguistic annotation engine failed on a document.
    #[error("Annotation failed: {0}")]
    Annotation(String),

    /// The semantic model was unavailable or returned an error.
    #[error("Semantic model error: {0}")]
    Semantic(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an annotation error.
    #[must_use]
    pub fn annotation(msg: impl Into<String>) -> Self {
        Self::Annotation(msg.into())
    }

    /// Create a semantic model error.
    #[must_use]
    pub fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
