use serde::Deserialize;

/// Main configuration structure for Mobile-Harvest
///
/// Every section is optional; missing keys fall back to the values the
/// scraper has always shipped with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub dubizzle: DubizzleConfig,
    #[serde(default)]
    pub mobilemasr: MobileMasrConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which execution context backs rendered page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    /// Fresh headless Chromium per session
    Chromium,
    /// Fresh HTTP client per session, no script execution
    Http,
}

/// Fetch behavior shared by both sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Attempts per fetch task, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Navigation timeout for a single attempt (seconds)
    #[serde(rename = "page-load-timeout-secs")]
    pub page_load_timeout_secs: u64,

    /// Post-load settle delay when no rendering is needed (milliseconds)
    #[serde(rename = "settle-ms")]
    pub settle_ms: u64,

    /// Post-load settle delay when client-side rendering is needed (milliseconds)
    #[serde(rename = "render-settle-ms")]
    pub render_settle_ms: u64,

    /// Settle delay after reloading a transient error page (milliseconds)
    #[serde(rename = "reload-settle-ms")]
    pub reload_settle_ms: u64,

    /// Documents must be longer than this to count as fetched
    #[serde(rename = "min-content-length")]
    pub min_content_length: usize,

    pub engine: BrowserEngine,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Phrases that mark a rendered page as a transient error page
    #[serde(rename = "error-phrases")]
    pub error_phrases: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_backoff_ms: 500,
            page_load_timeout_secs: 15,
            settle_ms: 1000,
            render_settle_ms: 3000,
            reload_settle_ms: 3000,
            min_content_length: 1000,
            engine: BrowserEngine::Chromium,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            error_phrases: vec!["حدث خطأ ما".to_string(), "Something went wrong".to_string()],
        }
    }
}

/// Rendered marketplace source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DubizzleConfig {
    /// Category listing root; pages are `{base-url}?page=N`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Origin that relative item links are resolved against
    pub origin: String,

    /// Path marker every item detail URL contains
    #[serde(rename = "item-path")]
    pub item_path: String,

    /// Concurrent listing/search page fetches
    #[serde(rename = "listing-concurrency")]
    pub listing_concurrency: u32,

    /// Concurrent item page fetches
    #[serde(rename = "detail-concurrency")]
    pub detail_concurrency: u32,
}

impl Default for DubizzleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.dubizzle.com.eg/en/mobile-phones-tablets-accessories-numbers/mobile-phones/"
                .to_string(),
            origin: "https://www.dubizzle.com.eg".to_string(),
            item_path: "/ad/".to_string(),
            listing_concurrency: 10,
            detail_concurrency: 10,
        }
    }
}

/// Structured search index source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MobileMasrConfig {
    /// Override for the index host; empty means `https://{app_id}-dsn.algolia.net`
    pub endpoint: String,

    #[serde(rename = "index-name")]
    pub index_name: String,

    /// Prefix for canonical product URLs
    #[serde(rename = "product-base-url")]
    pub product_base_url: String,

    #[serde(rename = "hits-per-page")]
    pub hits_per_page: u32,

    /// Concurrent index page queries
    pub concurrency: u32,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Location reported for every index record
    pub location: String,
}

impl Default for MobileMasrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index_name: "Variant_new_index".to_string(),
            product_base_url: "https://mobilemasr.com/en/product".to_string(),
            hits_per_page: 100,
            concurrency: 20,
            request_timeout_secs: 30,
            location: "Egypt".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory result files are written into
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

/// Static credentials for the search index, supplied out-of-band
#[derive(Clone, PartialEq, Eq)]
pub struct IndexCredentials {
    pub app_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for IndexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCredentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
