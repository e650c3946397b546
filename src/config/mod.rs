//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing configuration file is replaced by a generated default one.
//!
//! # Example
//!
//! ```no_run
//! use hh_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("settings.toml")).unwrap();
//! println!("Harvest limit: {}", config.search.limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, LogConfig, OutputConfig, ProviderConfig, RetryConfig, SearchConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_or_create_config,
    DEFAULT_CONFIG,
};
pub use validation::validate;
