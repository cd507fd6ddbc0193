// src/error.rs

//! Unified error handling for the catalog engine.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A keyword resource has an unrecognized header line
    #[error("Malformed keyword resource {path}: bad header line '{line}'")]
    MalformedResource { path: String, line: String },

    /// A tag resource references a parent or grant that does not exist
    #[error("Unknown tag '{name}' referenced by '{referenced_by}'")]
    UnknownTagReference { name: String, referenced_by: String },

    /// The tag graph contains a parent cycle
    #[error("Cyclic tag graph: {chain}")]
    CyclicTagGraph { chain: String },

    /// Configuration/data sanity check failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// An incoming listing is missing required fields
    #[error("Invalid listing data: {0}")]
    InvalidData(String),

    /// A store write conflicted with existing data
    #[error("Store conflict: {0}")]
    Conflict(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid-listing-data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Create a store conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a malformed-resource error.
    pub fn malformed_resource(path: impl Into<String>, line: impl Into<String>) -> Self {
        Self::MalformedResource {
            path: path.into(),
            line: line.into(),
        }
    }
}
