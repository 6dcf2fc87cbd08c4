//! Mobile-Harvest: a two-source mobile phone listing harvester
//!
//! This crate retrieves product listings from a rendered marketplace (Dubizzle)
//! and a structured search index (MobileMasr), and normalizes both into one
//! canonical [`ProductRecord`] shape.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod menu;
pub mod model;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Mobile-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No items discovered for {source_name}")]
    EmptyResult { source_name: String },
}

/// Configuration-specific errors
///
/// These are fatal: a run never starts when one is raised.
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

    #[error("ALGOLIA_APP_ID and ALGOLIA_API_KEY must be set (environment or .env file)")]
    MissingCredentials,

    #[error("Browser engine '{0}' is not available in this build")]
    UnsupportedEngine(String),
}

/// Errors from a single fetch attempt
///
/// Every variant is transient: the scheduler retries it until the attempt
/// budget is spent.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out after {seconds}s loading {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Content too short for {url}: {length} <= {minimum} characters")]
    ContentTooShort {
        url: String,
        length: usize,
        minimum: usize,
    },

    #[error("Browser session error: {0}")]
    Browser(String),

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Field extraction failures; the record is dropped and the batch continues
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("No product name found at {0}")]
    NoName(String),

    #[error("Search hit has neither slug nor id")]
    NoIdentifier,

    #[error("Malformed content at {url}: {message}")]
    Malformed { url: String, message: String },
}

/// Result type alias for Mobile-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Harvester, RunRequest, Source, SourceReport};
pub use model::{ProductRecord, RunSummary};
