use crate::config::types::{Config, IndexCredentials};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable holding the index application identifier
pub const APP_ID_VAR: &str = "ALGOLIA_APP_ID";

/// Environment variable holding the index API key
pub const API_KEY_VAR: &str = "ALGOLIA_API_KEY";

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
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use mobile_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Attempts per fetch: {}", config.scraper.max_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration at `path`, or the built-in defaults when no path is given
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Reads the index credentials from the environment
///
/// A `.env` file in the working directory is loaded first if present.
/// Returns `None` when either value is missing or blank; the caller decides
/// whether that is fatal.
pub fn load_credentials() -> Option<IndexCredentials> {
    dotenvy::dotenv().ok();
    credentials_from(std::env::var(APP_ID_VAR).ok(), std::env::var(API_KEY_VAR).ok())
}

/// Builds credentials from raw values, treating blank values as absent
pub fn credentials_from(app_id: Option<String>, api_key: Option<String>) -> Option<IndexCredentials> {
    let app_id = app_id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    let api_key = api_key.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    Some(IndexCredentials { app_id, api_key })
}
