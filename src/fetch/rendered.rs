//! Rendered page fetching through disposable browser sessions
//!
//! Every attempt launches its own session, uses it for exactly one URL, and
//! releases it on every exit path. Sessions are never pooled.

use crate::config::ScraperConfig;
use crate::fetch::{PageFetcher, PageTarget};
use crate::FetchError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One disposable execution context (browser tab, HTTP client, ...)
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads `url` into the session
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Reloads the current document
    async fn reload(&mut self) -> Result<(), FetchError>;

    /// Returns the current document markup
    async fn document(&mut self) -> Result<String, FetchError>;

    /// Tears the session down
    async fn close(self: Box<Self>) -> Result<(), FetchError>;
}

/// Produces a fresh session per call
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Launches a new isolated session; `render` enables script execution
    async fn launch(&self, render: bool) -> Result<Box<dyn BrowserSession>, FetchError>;
}

/// Decides whether a rendered document is a transient error page worth one reload
pub trait TransientPageDetector: Send + Sync {
    fn is_transient(&self, document: &str) -> bool;
}

/// Detects error pages by embedded phrases
#[derive(Debug, Clone)]
pub struct PhraseDetector {
    phrases: Vec<String>,
}

impl PhraseDetector {
    pub fn new(phrases: Vec<String>) -> Self {
        Self { phrases }
    }
}

impl TransientPageDetector for PhraseDetector {
    fn is_transient(&self, document: &str) -> bool {
        self.phrases.iter().any(|p| document.contains(p.as_str()))
    }
}

/// Scoped ownership of a session
///
/// Call [`SessionGuard::release`] to close it explicitly. If the guard is
/// dropped while still holding a session (attempt timeout, panic), the close
/// is spawned onto the current runtime instead.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    url: String,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>, url: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            url: url.into(),
        }
    }

    fn session(&mut self) -> Result<&mut Box<dyn BrowserSession>, FetchError> {
        self.session
            .as_mut()
            .ok_or_else(|| FetchError::Browser(format!("session for {} already released", self.url)))
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        self.session()?.navigate(url).await
    }

    pub async fn reload(&mut self) -> Result<(), FetchError> {
        self.session()?.reload().await
    }

    pub async fn document(&mut self) -> Result<String, FetchError> {
        self.session()?.document().await
    }

    /// Closes the session, logging (not returning) close failures
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!("Failed to close session for {}: {}", self.url, e);
            } else {
                tracing::trace!("Session closed for {}", self.url);
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let url = std::mem::take(&mut self.url);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = session.close().await {
                            tracing::warn!("Deferred session close failed for {}: {}", url, e);
                        }
                    });
                }
                Err(_) => {
                    tracing::warn!("No runtime to close session for {}; dropping it", url);
                }
            }
        }
    }
}

/// Timing knobs for one rendered fetch attempt
#[derive(Debug, Clone, Copy)]
pub struct RenderTimings {
    pub page_load_timeout: Duration,
    pub settle: Duration,
    pub render_settle: Duration,
    pub reload_settle: Duration,
}

impl RenderTimings {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            settle: Duration::from_millis(config.settle_ms),
            render_settle: Duration::from_millis(config.render_settle_ms),
            reload_settle: Duration::from_millis(config.reload_settle_ms),
        }
    }

    /// No waiting at all; navigation still times out after `page_load_timeout`
    pub fn immediate(page_load_timeout: Duration) -> Self {
        Self {
            page_load_timeout,
            settle: Duration::ZERO,
            render_settle: Duration::ZERO,
            reload_settle: Duration::ZERO,
        }
    }
}

/// Fetches marketplace pages through a fresh browser session per attempt
pub struct RenderedFetcher {
    launcher: Arc<dyn SessionLauncher>,
    detector: Arc<dyn TransientPageDetector>,
    timings: RenderTimings,
    min_content_length: usize,
}

impl RenderedFetcher {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        detector: Arc<dyn TransientPageDetector>,
        timings: RenderTimings,
        min_content_length: usize,
    ) -> Self {
        Self {
            launcher,
            detector,
            timings,
            min_content_length,
        }
    }

    /// Builds a fetcher from configuration with the phrase-based detector
    pub fn from_config(config: &ScraperConfig, launcher: Arc<dyn SessionLauncher>) -> Self {
        Self::new(
            launcher,
            Arc::new(PhraseDetector::new(config.error_phrases.clone())),
            RenderTimings::from_config(config),
            config.min_content_length,
        )
    }

    async fn load(&self, guard: &mut SessionGuard, target: &PageTarget) -> Result<String, FetchError> {
        self.within_page_load(&target.url, guard.navigate(&target.url))
            .await?;

        let settle = if target.render_required {
            self.timings.render_settle
        } else {
            self.timings.settle
        };
        tokio::time::sleep(settle).await;

        let mut document = guard.document().await?;

        if target.render_required && self.detector.is_transient(&document) {
            tracing::debug!("Transient error page at {}, reloading once", target.url);
            self.within_page_load(&target.url, guard.reload()).await?;
            tokio::time::sleep(self.timings.reload_settle).await;
            document = guard.document().await?;
        }

        let length = document.chars().count();
        if length <= self.min_content_length {
            return Err(FetchError::ContentTooShort {
                url: target.url.clone(),
                length,
                minimum: self.min_content_length,
            });
        }

        Ok(document)
    }

    async fn within_page_load<F>(&self, url: &str, fut: F) -> Result<(), FetchError>
    where
        F: Future<Output = Result<(), FetchError>>,
    {
        match tokio::time::timeout(self.timings.page_load_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timings.page_load_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl PageFetcher for RenderedFetcher {
    type Target = PageTarget;
    type Content = String;

    async fn fetch(&self, target: &PageTarget) -> Result<String, FetchError> {
        let session = self.launcher.launch(target.render_required).await?;
        let mut guard = SessionGuard::new(session, target.url.clone());

        let result = self.load(&mut guard, target).await;
        guard.release().await;
        result
    }
}
