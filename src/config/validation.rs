use crate::config::types::{Config, OutputConfig, ProviderConfig, RetryConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_provider_config(&config.provider)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search query cannot be empty".to_string(),
        ));
    }

    if config.limit < 1 {
        return Err(ConfigError::Validation(format!(
            "limit must be >= 1, got {}",
            config.limit
        )));
    }

    // hh.ru refuses page sizes above 100
    if config.prefetch < 1 || config.prefetch > 100 {
        return Err(ConfigError::Validation(format!(
            "prefetch must be between 1 and 100, got {}",
            config.prefetch
        )));
    }

    Ok(())
}

fn validate_provider_config(config: &ProviderConfig) -> Result<(), ConfigError> {
    validate_endpoint("search-endpoint", &config.search_endpoint)?;
    validate_endpoint("api-endpoint", &config.api_endpoint)?;
    validate_endpoint("vacancy-details-endpoint", &config.vacancy_details_endpoint)?;

    if config.request_timeout_in_seconds < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-in-seconds must be >= 1".to_string(),
        ));
    }

    if config.detail_concurrency < 1 || config.detail_concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "detail-concurrency must be between 1 and 64, got {}",
            config.detail_concurrency
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-ms ({}) cannot exceed max-backoff-ms ({})",
            config.backoff_ms, config.max_backoff_ms
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that an endpoint is an absolute http(s) URL
fn validate_endpoint(name: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, endpoint, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, endpoint
        )));
    }

    Ok(())
}
