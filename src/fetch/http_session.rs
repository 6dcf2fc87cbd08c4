//! Script-free sessions backed by a throwaway HTTP client
//!
//! Each session builds its own `reqwest::Client`, so no connection pool or
//! cookie jar is shared between fetches.

use crate::config::ScraperConfig;
use crate::fetch::rendered::{BrowserSession, SessionLauncher};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Launches HTTP-only sessions
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    user_agent: String,
    timeout: Duration,
}

impl HttpLauncher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.page_load_timeout_secs),
        }
    }

    fn build_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn launch(&self, _render: bool) -> Result<Box<dyn BrowserSession>, FetchError> {
        let client = self
            .build_client()
            .map_err(|e| FetchError::Browser(format!("failed to build HTTP client: {}", e)))?;

        Ok(Box::new(HttpSession {
            client,
            timeout_secs: self.timeout.as_secs(),
            url: None,
            body: String::new(),
        }))
    }
}

/// A single-use HTTP session
struct HttpSession {
    client: Client,
    timeout_secs: u64,
    url: Option<String>,
    body: String,
}

impl HttpSession {
    async fn load(&mut self, url: &str) -> Result<(), FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    seconds: self.timeout_secs,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        self.body = response.text().await.map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        self.url = Some(url.to_string());
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        self.load(url).await
    }

    async fn reload(&mut self) -> Result<(), FetchError> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| FetchError::Browser("reload before navigation".to_string()))?;
        self.load(&url).await
    }

    async fn document(&mut self) -> Result<String, FetchError> {
        Ok(self.body.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        Ok(())
    }
}
