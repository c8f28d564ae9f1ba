// src/error.rs

//! Unified error handling for the paste monitor.
//!
//! [`AppError`] is what fallible functions return. Failures that happen while
//! the pipeline is running are wrapped into an [`OperationalError`] tagged
//! with the [`Stage`] they came from and sent down the error route.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Keyword pattern failed to compile
    #[error("Invalid pattern for keyword '{keyword}': {message}")]
    Pattern { keyword: String, message: String },

    /// Upstream answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Request aborted by shutdown
    #[error("Request to {0} cancelled")]
    Cancelled(String),

    /// Background task panicked or was aborted
    #[error("Task error: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a pattern compilation error.
    pub fn pattern(keyword: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pattern {
            keyword: keyword.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Pipeline stage an operational error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ListFetch,
    ItemFetch,
    Delivery,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ListFetch => "list-fetch",
            Stage::ItemFetch => "item-fetch",
            Stage::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal failure carried on the error route.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage}: {message}")]
pub struct OperationalError {
    pub stage: Stage,
    pub message: String,
}

impl OperationalError {
    pub fn new(stage: Stage, error: impl fmt::Display) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}
