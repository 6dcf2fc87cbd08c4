//! Two-phase pipeline for the rendered marketplace
//!
//! Phase one fetches every listing page and is fully drained before phase two
//! fetches the deduplicated item pages.

use crate::config::{Config, DubizzleConfig};
use crate::crawler::dedupe::dedupe;
use crate::crawler::scheduler::{RetryPolicy, Scheduler};
use crate::crawler::RunRequest;
use crate::extract::{ListingParser, PageExtractor, PageLayout};
use crate::fetch::{build_launcher, PageFetcher, PageTarget, RenderedFetcher};
use crate::model::RunSummary;
use crate::output::ResultAggregator;
use crate::ConfigError;
use std::sync::Arc;
use std::time::Instant;

/// Builds the listing page URLs for a run
///
/// Full catalog: `{base}?page=N`. Search: `{base}q-{slug}/?page=N`, where the
/// slug is the lowercased query with spaces turned into dashes. Pages start at 1.
pub fn seed_urls(base_url: &str, request: &RunRequest) -> Vec<String> {
    let root = if request.is_search() {
        let slug = request.query.trim().to_lowercase().replace(' ', "-");
        format!("{}q-{}/", base_url, slug)
    } else {
        base_url.to_string()
    };

    (1..=request.max_pages)
        .map(|page| format!("{}?page={}", root, page))
        .collect()
}

/// Rendered marketplace pipeline
pub struct DubizzlePipeline<F = RenderedFetcher> {
    fetcher: Arc<F>,
    listing_parser: Arc<ListingParser>,
    extractor: Arc<PageExtractor>,
    listing_scheduler: Scheduler,
    detail_scheduler: Scheduler,
    base_url: String,
}

impl DubizzlePipeline<RenderedFetcher> {
    /// Builds the pipeline with the configured browser engine
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let launcher = build_launcher(&config.scraper)?;
        let fetcher = RenderedFetcher::from_config(&config.scraper, launcher);
        Self::new(Arc::new(fetcher), config)
    }
}

impl<F> DubizzlePipeline<F>
where
    F: PageFetcher<Target = PageTarget, Content = String>,
{
    pub fn new(fetcher: Arc<F>, config: &Config) -> Result<Self, ConfigError> {
        let DubizzleConfig {
            base_url,
            origin,
            item_path,
            listing_concurrency,
            detail_concurrency,
        } = &config.dubizzle;
        let policy = RetryPolicy::from_config(&config.scraper);

        Ok(Self {
            fetcher,
            listing_parser: Arc::new(ListingParser::new(origin, item_path)?),
            extractor: Arc::new(PageExtractor::new(&PageLayout::default())?),
            listing_scheduler: Scheduler::new(*listing_concurrency as usize, policy),
            detail_scheduler: Scheduler::new(*detail_concurrency as usize, policy),
            base_url: base_url.clone(),
        })
    }

    pub fn seed_urls(&self, request: &RunRequest) -> Vec<String> {
        seed_urls(&self.base_url, request)
    }

    /// Runs both phases and returns the summary
    ///
    /// Never fails: unreachable pages are counted, and finding no items at
    /// all yields an empty summary.
    pub async fn run(&self, request: &RunRequest) -> RunSummary {
        let started = Instant::now();
        let mut aggregator = ResultAggregator::new("Dubizzle", started);

        if request.is_search() {
            tracing::info!("[Dubizzle] Searching for '{}'", request.query.trim());
        }
        let seeds: Vec<PageTarget> = self
            .seed_urls(request)
            .into_iter()
            .map(PageTarget::listing)
            .collect();
        tracing::info!(
            "[Dubizzle] Fetching {} listing pages ({} at a time)",
            seeds.len(),
            self.listing_scheduler.max_concurrency()
        );

        let parser = Arc::clone(&self.listing_parser);
        let pages = self
            .listing_scheduler
            .run_all(Arc::clone(&self.fetcher), seeds, move |target, html| {
                Ok((target.url.clone(), parser.extract_urls(&html)))
            })
            .await;

        let mut discovered = Vec::new();
        for page in pages {
            match page {
                Ok((url, urls)) => {
                    tracing::info!("[Dubizzle] Found {} products on {}", urls.len(), url);
                    discovered.extend(urls);
                }
                Err(_) => aggregator.record_discovery_failure(),
            }
        }

        let unique = dedupe(discovered);
        tracing::info!("[Dubizzle] Found {} unique products", unique.len());
        if unique.is_empty() {
            tracing::warn!("[Dubizzle] No products found");
            return aggregator.finish();
        }

        aggregator.expect(unique.len());
        let items: Vec<PageTarget> = unique.into_iter().map(PageTarget::item).collect();
        tracing::info!(
            "[Dubizzle] Scraping {} product pages ({} at a time)",
            items.len(),
            self.detail_scheduler.max_concurrency()
        );

        let extractor = Arc::clone(&self.extractor);
        self.detail_scheduler
            .run_each(
                Arc::clone(&self.fetcher),
                items,
                move |target, html| extractor.extract_record(&html, &target.url),
                |outcome| aggregator.record(outcome),
            )
            .await;

        let summary = aggregator.finish();
        tracing::info!(
            "[Dubizzle] Scraped {}/{} products in {:.1}s",
            summary.records.len(),
            summary.requested_count,
            summary.elapsed.as_secs_f64()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://www.dubizzle.com.eg/en/mobile-phones/";

    /// Serves canned documents; unknown URLs fail
    struct CannedFetcher {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<PageTarget>>,
    }

    impl CannedFetcher {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        type Target = PageTarget;
        type Content = String;

        async fn fetch(&self, target: &PageTarget) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(target.clone());
            self.pages
                .get(&target.url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: target.url.clone(),
                    status: 404,
                })
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.dubizzle.base_url = BASE.to_string();
        config.scraper.retry_backoff_ms = 0;
        config
    }

    fn listing(ids: &[&str]) -> String {
        ids.iter()
            .map(|id| format!(r#"<li aria-label="Listing"><article><a href="/en/ad/{}.html">x</a></article></li>"#, id))
            .collect()
    }

    fn item_url(id: &str) -> String {
        format!("https://www.dubizzle.com.eg/en/ad/{}.html", id)
    }

    #[test]
    fn test_seed_urls_full_catalog() {
        let urls = seed_urls(BASE, &RunRequest::full_catalog(3));
        assert_eq!(
            urls,
            vec![
                format!("{}?page=1", BASE),
                format!("{}?page=2", BASE),
                format!("{}?page=3", BASE),
            ]
        );
    }

    #[test]
    fn test_seed_urls_search() {
        let urls = seed_urls(BASE, &RunRequest::search("iPhone 13 Pro", 1));
        assert_eq!(urls, vec![format!("{}q-iphone-13-pro/?page=1", BASE)]);
    }

    #[test]
    fn test_seed_urls_zero_pages() {
        assert!(seed_urls(BASE, &RunRequest::full_catalog(0)).is_empty());
    }

    #[tokio::test]
    async fn test_two_phase_run() {
        let fetcher = Arc::new(CannedFetcher::new(vec![
            (format!("{}?page=1", BASE), listing(&["a", "b"])),
            (format!("{}?page=2", BASE), listing(&["b", "c", "bad"])),
            (item_url("a"), "<h1>Phone A</h1>".to_string()),
            (item_url("b"), "<h1>Phone B</h1>".to_string()),
            (item_url("c"), "<h1>Phone C</h1>".to_string()),
            (item_url("bad"), "<p>no title</p>".to_string()),
        ]));

        let pipeline = DubizzlePipeline::new(Arc::clone(&fetcher), &config()).unwrap();
        let summary = pipeline.run(&RunRequest::full_catalog(2)).await;

        assert_eq!(summary.requested_count, 4);
        assert_eq!(summary.records.len(), 3);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.discovery_failures, 0);

        let requests = fetcher.requests.lock().unwrap();
        let listing_flags: Vec<bool> = requests
            .iter()
            .filter(|t| t.url.contains("?page="))
            .map(|t| t.render_required)
            .collect();
        assert!(listing_flags.iter().all(|r| *r));
        assert!(requests
            .iter()
            .filter(|t| t.url.contains("/ad/"))
            .all(|t| !t.render_required));

        // Every listing fetch precedes every item fetch
        let last_listing = requests.iter().rposition(|t| t.url.contains("?page=")).unwrap();
        let first_item = requests.iter().position(|t| t.url.contains("/ad/")).unwrap();
        assert!(last_listing < first_item);
    }

    #[tokio::test]
    async fn test_failed_listing_pages_are_counted() {
        let fetcher = Arc::new(CannedFetcher::new(vec![
            (format!("{}?page=1", BASE), listing(&["a"])),
            (item_url("a"), "<h1>Phone A</h1>".to_string()),
        ]));

        let pipeline = DubizzlePipeline::new(fetcher, &config()).unwrap();
        let summary = pipeline.run(&RunRequest::full_catalog(3)).await;

        assert_eq!(summary.discovery_failures, 2);
        assert_eq!(summary.records.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_discovered_is_empty_summary() {
        let fetcher = Arc::new(CannedFetcher::new(vec![(
            format!("{}?page=1", BASE),
            "<html><body>no listings</body></html>".to_string(),
        )]));

        let pipeline = DubizzlePipeline::new(fetcher, &config()).unwrap();
        let summary = pipeline.run(&RunRequest::full_catalog(1)).await;

        assert!(summary.is_empty());
        assert_eq!(summary.requested_count, 0);
    }
}
