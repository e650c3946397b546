//! HH Harvester: a job-board vacancy ingestion pipeline
//!
//! This crate pulls vacancy postings from hh.ru either through the public JSON
//! API or by scraping the rendered search pages, and yields a bounded,
//! deduplicated stream of normalized vacancies to a SQLite datastore.

pub mod config;
pub mod harvester;
pub mod models;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("No search results: {0}")]
    NoSearchResults(String),

    #[error("Upstream format changed: {0}")]
    UpstreamFormatChanged(String),

    #[error("Could not decode payload from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Coarse classification of a [`HarvestError`], used to decide retryability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request did not complete within the configured timeout
    Timeout,
    /// The upstream answered with a non-success status
    Status,
    /// Connection-level failure (refused, reset, DNS, body read)
    Transport,
    /// The search matched nothing
    NoSearchResults,
    /// An expected structural element was missing or unparsable
    UpstreamFormatChanged,
    /// A JSON payload could not be decoded
    Decode,
    /// Configuration, storage and other local failures
    Internal,
}

impl HarvestError {
    /// Returns the taxonomy bucket this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Status { .. } => ErrorKind::Status,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::NoSearchResults(_) => ErrorKind::NoSearchResults,
            Self::UpstreamFormatChanged(_) => ErrorKind::UpstreamFormatChanged,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Config(_)
            | Self::Storage(_)
            | Self::Database(_)
            | Self::HttpClient(_) => ErrorKind::Internal,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{each_vacancy, HarvestOutcome, Harvester, SearchQuery, SourceKind, VacancyStream};
pub use models::{Skill, Vacancy};
