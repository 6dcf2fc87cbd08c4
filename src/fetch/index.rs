//! Structured search index queries
//!
//! The index answers `{query, page, hitsPerPage}` with a page of opaque hit
//! objects. Each fetch builds its own HTTP client and sends exactly one query.

use crate::config::{IndexCredentials, MobileMasrConfig};
use crate::fetch::PageFetcher;
use crate::{ConfigError, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One page request against the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexQuery {
    pub query: String,
    pub page: u32,
    #[serde(rename = "hitsPerPage")]
    pub hits_per_page: u32,
}

impl fmt::Display for IndexQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index page {} (query '{}')", self.page, self.query)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "nbHits", default)]
    pub nb_hits: u64,

    #[serde(rename = "nbPages", default = "default_nb_pages")]
    pub nb_pages: u32,

    #[serde(default)]
    pub hits: Vec<serde_json::Value>,
}

fn default_nb_pages() -> u32 {
    1
}

/// Fetches result pages from the search index
#[derive(Debug, Clone)]
pub struct IndexFetcher {
    credentials: IndexCredentials,
    query_url: String,
    timeout: Duration,
}

impl IndexFetcher {
    /// Creates a fetcher for the configured index
    ///
    /// # Returns
    ///
    /// * `Ok(IndexFetcher)` - Ready to query
    /// * `Err(ConfigError::MissingCredentials)` - No credentials were supplied
    pub fn new(
        config: &MobileMasrConfig,
        credentials: Option<IndexCredentials>,
    ) -> Result<Self, ConfigError> {
        let credentials = credentials.ok_or(ConfigError::MissingCredentials)?;

        let host = if config.endpoint.is_empty() {
            format!("https://{}-dsn.algolia.net", credentials.app_id)
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };
        let query_url = format!("{}/1/indexes/{}/query", host, config.index_name);

        Ok(Self {
            credentials,
            query_url,
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Full URL queries are posted to
    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    fn build_client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .timeout(self.timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Transport {
                url: self.query_url.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })
    }
}

#[async_trait]
impl PageFetcher for IndexFetcher {
    type Target = IndexQuery;
    type Content = SearchPage;

    async fn fetch(&self, target: &IndexQuery) -> Result<SearchPage, FetchError> {
        let client = self.build_client()?;

        let response = client
            .post(&self.query_url)
            .header("X-Algolia-Application-Id", &self.credentials.app_id)
            .header("X-Algolia-API-Key", &self.credentials.api_key)
            .json(target)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: self.query_url.clone(),
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    FetchError::Transport {
                        url: self.query_url.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                "Index returned {} for {}: {}",
                status,
                target,
                body.chars().take(500).collect::<String>()
            );
            return Err(FetchError::Status {
                url: self.query_url.clone(),
                status: status.as_u16(),
            });
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| FetchError::Decode {
                url: self.query_url.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Option<IndexCredentials> {
        Some(IndexCredentials {
            app_id: "APPID".to_string(),
            api_key: "SECRET".to_string(),
        })
    }

    fn config_for(server: &MockServer) -> MobileMasrConfig {
        MobileMasrConfig {
            endpoint: server.uri(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_credentials_is_fatal() {
        let result = IndexFetcher::new(&MobileMasrConfig::default(), None);
        assert!(matches!(result, Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_default_endpoint_uses_app_id() {
        let fetcher = IndexFetcher::new(&MobileMasrConfig::default(), credentials()).unwrap();
        assert_eq!(
            fetcher.query_url(),
            "https://APPID-dsn.algolia.net/1/indexes/Variant_new_index/query"
        );
    }

    #[test]
    fn test_query_serializes_hits_per_page() {
        let query = IndexQuery {
            query: "iphone".to_string(),
            page: 2,
            hits_per_page: 100,
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"query": "iphone", "page": 2, "hitsPerPage": 100}));
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/indexes/Variant_new_index/query"))
            .and(header("X-Algolia-Application-Id", "APPID"))
            .and(header("X-Algolia-API-Key", "SECRET"))
            .and(body_json(serde_json::json!({"query": "", "page": 0, "hitsPerPage": 100})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nbHits": 2,
                "nbPages": 1,
                "hits": [{"brand_en": "Apple"}, {"brand_en": "Samsung"}]
            })))
            .mount(&server)
            .await;

        let fetcher = IndexFetcher::new(&config_for(&server), credentials()).unwrap();
        let page = fetcher
            .fetch(&IndexQuery {
                query: String::new(),
                page: 0,
                hits_per_page: 100,
            })
            .await
            .unwrap();

        assert_eq!(page.nb_hits, 2);
        assert_eq!(page.nb_pages, 1);
        assert_eq!(page.hits.len(), 2);
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let fetcher = IndexFetcher::new(&config_for(&server), credentials()).unwrap();
        let err = fetcher
            .fetch(&IndexQuery {
                query: String::new(),
                page: 0,
                hits_per_page: 100,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher = IndexFetcher::new(&config_for(&server), credentials()).unwrap();
        let err = fetcher
            .fetch(&IndexQuery {
                query: String::new(),
                page: 0,
                hits_per_page: 100,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
