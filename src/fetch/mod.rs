//! Page fetchers for both sources
//!
//! This module contains:
//! - The [`PageFetcher`] contract: one attempt, one disposable execution context
//! - [`RenderedFetcher`]: browser-session based fetching for the marketplace
//! - [`IndexFetcher`]: structured queries against the search index
//! - Session launchers backing the rendered fetcher
//!
//! Retrying is not done here; the scheduler drives attempts through
//! [`FetchTask`] so every fetcher shares one retry contract.

#[cfg(feature = "headless")]
mod chromium;
mod http_session;
mod index;
mod rendered;

#[cfg(feature = "headless")]
pub use chromium::ChromiumLauncher;
pub use http_session::HttpLauncher;
pub use index::{IndexFetcher, IndexQuery, SearchPage};
pub use rendered::{
    BrowserSession, PhraseDetector, RenderTimings, RenderedFetcher, SessionGuard,
    SessionLauncher, TransientPageDetector,
};

use crate::config::{BrowserEngine, ScraperConfig};
use crate::{ConfigError, FetchError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Contract shared by every fetcher
///
/// `fetch` performs exactly one attempt with a fresh execution context.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    /// What a single fetch is aimed at
    type Target: Clone + fmt::Display + Send + Sync + 'static;

    /// What a successful fetch yields
    type Content: Send + 'static;

    async fn fetch(&self, target: &Self::Target) -> Result<Self::Content, FetchError>;
}

/// A rendered page to retrieve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub url: String,

    /// Wait for client-side rendering before reading the document
    pub render_required: bool,
}

impl PageTarget {
    /// A listing or search page, rendered by the browser
    pub fn listing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            render_required: true,
        }
    }

    /// An item detail page, read without rendering
    pub fn item(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            render_required: false,
        }
    }
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Transient work item owned by the scheduler until it reaches a terminal outcome
#[derive(Debug, Clone)]
pub struct FetchTask<T> {
    pub target: T,
    pub attempt_count: u32,
    pub max_attempts: u32,
}

impl<T> FetchTask<T> {
    pub fn new(target: T, max_attempts: u32) -> Self {
        Self {
            target,
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns true if the attempt budget allows another try
    pub fn can_attempt(&self) -> bool {
        self.attempt_count < self.max_attempts
    }
}

/// Builds the session launcher selected by the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn SessionLauncher>)` - Launcher for the configured engine
/// * `Err(ConfigError)` - The engine was not compiled into this build
pub fn build_launcher(config: &ScraperConfig) -> Result<Arc<dyn SessionLauncher>, ConfigError> {
    match config.engine {
        BrowserEngine::Http => Ok(Arc::new(HttpLauncher::new(config))),
        #[cfg(feature = "headless")]
        BrowserEngine::Chromium => Ok(Arc::new(ChromiumLauncher::new(config))),
        #[cfg(not(feature = "headless"))]
        BrowserEngine::Chromium => Err(ConfigError::UnsupportedEngine("chromium".to_string())),
    }
}
