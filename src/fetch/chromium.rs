//! Headless Chromium sessions
//!
//! Each session is a whole browser process with one tab. Nothing is reused
//! between sessions, which keeps cookies, storage and crash state isolated.

use crate::config::ScraperConfig;
use crate::fetch::rendered::{BrowserSession, SessionLauncher};
use crate::FetchError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetScriptExecutionDisabledParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Hardening flags applied to every launched browser
const BROWSER_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-features=VizDisplayCompositor",
    "--disable-blink-features=AutomationControlled",
    "--disable-extensions",
    "--disable-images",
    "--blink-settings=imagesEnabled=false",
];

/// Launches one headless Chromium per session
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    user_agent: String,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: Duration::from_secs(config.page_load_timeout_secs),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, FetchError> {
        BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout)
            .args(BROWSER_ARGS.iter().copied())
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(FetchError::Browser)
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, render: bool) -> Result<Box<dyn BrowserSession>, FetchError> {
        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| FetchError::Browser(format!("failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let mut session = ChromiumSession {
            browser,
            page: None,
            handler,
        };

        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(format!("failed to open tab: {}", e)))?;

        if !render {
            page.execute(SetScriptExecutionDisabledParams::new(true))
                .await
                .map_err(|e| FetchError::Browser(format!("failed to disable scripts: {}", e)))?;
        }

        session.page = Some(page);
        Ok(Box::new(session))
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, FetchError> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::Browser("tab already closed".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        self.page()?
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn reload(&mut self) -> Result<(), FetchError> {
        self.page()?
            .reload()
            .await
            .map(|_| ())
            .map_err(|e| FetchError::Browser(format!("reload failed: {}", e)))
    }

    async fn document(&mut self) -> Result<String, FetchError> {
        self.page()?
            .content()
            .await
            .map_err(|e| FetchError::Browser(format!("failed to read document: {}", e)))
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        let mut this = self;
        if let Some(page) = this.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("Tab close failed: {}", e);
            }
        }

        this.browser
            .close()
            .await
            .map_err(|e| FetchError::Browser(format!("failed to close browser: {}", e)))?;
        this.browser
            .wait()
            .await
            .map_err(|e| FetchError::Browser(format!("browser did not exit: {}", e)))?;
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process if it is still running
        self.handler.abort();
    }
}
