use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Configuration written when no settings file exists yet
pub const DEFAULT_CONFIG: &str = r#"[search]
query = "middle python developer"
limit = 100
prefetch = 50

[provider]
search-endpoint = "https://hh.ru/search/vacancy"
api-endpoint = "https://api.hh.ru/vacancies"
vacancy-details-endpoint = "https://hh.ru/vacancy/"
request-timeout-in-seconds = 15
detail-concurrency = 10

[retry]
max-attempts = 3
backoff-ms = 500
max-backoff-ms = 5000

[output]
database-path = "vacancies.db"

[log]
level = "info"
"#;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the settings that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

/// Loads the configuration, generating the default file first if it is missing
///
/// # Returns
///
/// * `Ok((Config, String))` - Configuration and the hash of the file it came from
/// * `Err(ConfigError)` - The existing file is invalid or the default could not be written
pub fn load_or_create_config(path: &Path) -> Result<(Config, String), ConfigError> {
    if !path.exists() {
        std::fs::write(path, DEFAULT_CONFIG)?;
        tracing::info!("Default configuration was generated to {}", path.display());
    }

    load_config_with_hash(path)
}
