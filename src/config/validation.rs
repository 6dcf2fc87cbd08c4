use crate::config::types::{Config, DubizzleConfig, MobileMasrConfig, OutputConfig, ScraperConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for any concurrency setting
const MAX_CONCURRENCY: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_dubizzle_config(&config.dubizzle)?;
    validate_mobilemasr_config(&config.mobilemasr)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates fetch behavior settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.page_load_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page-load-timeout-secs must be >= 1, got {}",
            config.page_load_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.error_phrases.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(
            "error-phrases cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates the rendered marketplace settings
fn validate_dubizzle_config(config: &DubizzleConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("origin", &config.origin)?;

    if config.item_path.is_empty() {
        return Err(ConfigError::Validation(
            "item-path cannot be empty".to_string(),
        ));
    }

    validate_concurrency("listing-concurrency", config.listing_concurrency)?;
    validate_concurrency("detail-concurrency", config.detail_concurrency)?;
    Ok(())
}

/// Validates the search index settings
fn validate_mobilemasr_config(config: &MobileMasrConfig) -> Result<(), ConfigError> {
    if !config.endpoint.is_empty() {
        validate_http_url("endpoint", &config.endpoint)?;
    }
    validate_http_url("product-base-url", &config.product_base_url)?;

    if config.index_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "index-name cannot be empty".to_string(),
        ));
    }

    if config.hits_per_page < 1 || config.hits_per_page > 1000 {
        return Err(ConfigError::Validation(format!(
            "hits-per-page must be between 1 and 1000, got {}",
            config.hits_per_page
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    validate_concurrency("concurrency", config.concurrency)
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_concurrency(name: &str, value: u32) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_CONCURRENCY, value
        )));
    }
    Ok(())
}

/// Validates that a setting holds an absolute HTTP(S) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        assert!(validate_concurrency("c", 1).is_ok());
        assert!(validate_concurrency("c", 100).is_ok());
        assert!(validate_concurrency("c", 0).is_err());
        assert!(validate_concurrency("c", 101).is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("u", "https://example.com/").is_ok());
        assert!(validate_http_url("u", "http://127.0.0.1:8080").is_ok());
        assert!(validate_http_url("u", "ftp://example.com").is_err());
        assert!(validate_http_url("u", "not a url").is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.scraper.max_attempts = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_hits_per_page_bounds() {
        let mut config = Config::default();
        config.mobilemasr.hits_per_page = 0;
        assert!(validate(&config).is_err());
        config.mobilemasr.hits_per_page = 1001;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_endpoint_allowed() {
        let mut config = Config::default();
        config.mobilemasr.endpoint = String::new();
        assert!(validate(&config).is_ok());
        config.mobilemasr.endpoint = "nope".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }
}
