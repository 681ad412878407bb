use crate::config::types::{Config, HarvestConfig, OutputConfig, SiteConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on concurrent detail fetches for one listing page
const MAX_ENRICHMENT_CONCURRENCY: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_harvest_config(&config.harvest)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    let origin = parse_http_url("origin", &config.origin)?;

    if origin.path() != "/" || origin.query().is_some() {
        return Err(ConfigError::Validation(format!(
            "origin must not carry a path or query, got '{}'",
            config.origin
        )));
    }

    if config.origin.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "origin must not end with '/', got '{}'",
            config.origin
        )));
    }

    parse_http_url("categories-url", &config.categories_url)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl behavior settings
fn validate_harvest_config(config: &HarvestConfig) -> ConfigResult<()> {
    if config.default_count < 1 {
        return Err(ConfigError::Validation(
            "default-count must be >= 1".to_string(),
        ));
    }

    if config.enrichment_concurrency < 1
        || config.enrichment_concurrency > MAX_ENRICHMENT_CONCURRENCY
    {
        return Err(ConfigError::Validation(format!(
            "enrichment-concurrency must be between 1 and {}, got {}",
            MAX_ENRICHMENT_CONCURRENCY, config.enrichment_concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.category_cache.is_empty() {
        return Err(ConfigError::Validation(
            "category-cache cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn parse_http_url(key: &str, value: &str) -> ConfigResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(url)
}
