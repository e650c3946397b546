use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Default search parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Free-text search query
    pub query: String,

    /// Maximum number of vacancies one run may emit
    pub limit: usize,

    /// Number of listing items requested per page
    pub prefetch: usize,
}

/// Remote job board endpoints and request tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Rendered search results page (HTML variant)
    #[serde(rename = "search-endpoint")]
    pub search_endpoint: String,

    /// JSON vacancy search endpoint (API variant)
    #[serde(rename = "api-endpoint")]
    pub api_endpoint: String,

    /// Prefix for vacancy pages; the external id is appended
    #[serde(rename = "vacancy-details-endpoint")]
    pub vacancy_details_endpoint: String,

    /// Per-request timeout
    #[serde(
        rename = "request-timeout-in-seconds",
        default = "default_request_timeout"
    )]
    pub request_timeout_in_seconds: u64,

    /// Maximum in-flight detail fetches for one page
    #[serde(rename = "detail-concurrency", default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_in_seconds)
    }
}

/// Retry behaviour for listing and detail fetches
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubled on every further retry
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Upper bound for a single backoff delay
    #[serde(rename = "max-backoff-ms", default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default log level when no verbosity flag is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_request_timeout() -> u64 {
    15
}

fn default_detail_concurrency() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}
