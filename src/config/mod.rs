//! Configuration module for Mobile-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading the search index credentials from the environment.
//!
//! # Example
//!
//! ```no_run
//! use mobile_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Detail concurrency: {}", config.dubizzle.detail_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserEngine, Config, DubizzleConfig, IndexCredentials, MobileMasrConfig, OutputConfig,
    ScraperConfig,
};

// Re-export parser functions
pub use parser::{
    credentials_from, load_config, load_config_or_default, load_credentials, parse_config,
    API_KEY_VAR, APP_ID_VAR,
};
pub use validation::validate;
