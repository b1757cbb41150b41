//! Error types for the haul harvester
//!
//! This module defines the domain error enums used by the scrapers, the
//! initializer and the artifact writer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Server responded with status {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the server reported that the page does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status(404))
    }
}

/// Errors raised by a scraper's collection operation
#[derive(Error, Debug)]
pub enum CollectionError {
    /// Fetch error
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Collection exceeded the per-site time budget
    #[error("Collection timed out after {secs}s")]
    TimedOut { secs: u64 },

    /// Any other failure reported by a scraper
    #[error("{0}")]
    Failed(String),
}

impl CollectionError {
    /// Create a generic collection failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Errors that can occur while constructing a scraper instance
#[derive(Error, Debug)]
pub enum InitError {
    /// No implementation is registered under this identity
    #[error("Unknown scraper '{0}'")]
    UnknownScraper(String),

    /// The registry marks the site as failed/disabled
    #[error("Site '{0}' is disabled in the registry")]
    Disabled(String),

    /// The listing definition is invalid
    #[error("Invalid listing definition for '{scraper}': {reason}")]
    InvalidListing { scraper: String, reason: String },

    /// HTTP client construction failed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
}

/// Errors that can occur while writing a JSON artifact
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem error
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}
