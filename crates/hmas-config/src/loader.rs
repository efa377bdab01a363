//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::HmasConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load and validate configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<HmasConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: HmasConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &HmasConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.server.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "server.base_url must not be empty".to_string(),
        ));
    }

    if !config.server.base_url.starts_with("http://") && !config.server.base_url.starts_with("https://") {
        return Err(ConfigError::Invalid(format!(
            "server.base_url must be an http(s) URL, got '{}'",
            config.server.base_url
        )));
    }

    if config.client.timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "client.timeout_ms must be > 0".to_string(),
        ));
    }

    if config.client.retry_base_delay_ms > config.client.retry_max_delay_ms {
        return Err(ConfigError::Invalid(
            "client.retry_base_delay_ms must be <= client.retry_max_delay_ms".to_string(),
        ));
    }

    if let Some(status) = config
        .client
        .retry_on_status
        .iter()
        .find(|s| !(100..=599).contains(*s))
    {
        return Err(ConfigError::Invalid(format!(
            "client.retry_on_status contains invalid status {}",
            status
        )));
    }

    if config.crawl.max_depth == 0 {
        return Err(ConfigError::Invalid(
            "crawl.max_depth must be > 0".to_string(),
        ));
    }

    if config.crawl.max_nodes == 0 {
        return Err(ConfigError::Invalid(
            "crawl.max_nodes must be > 0".to_string(),
        ));
    }

    Ok(())
}
