//! Search index pipeline
//!
//! Page 0 is fetched alone to learn how many pages exist; the remaining pages
//! up to the requested bound are then fetched concurrently. Every hit is one
//! item and needs no further fetch.

use crate::config::{Config, IndexCredentials};
use crate::crawler::scheduler::{RetryPolicy, Scheduler, TaskFailure};
use crate::crawler::RunRequest;
use crate::extract::HitExtractor;
use crate::fetch::{IndexFetcher, IndexQuery, PageFetcher, SearchPage};
use crate::model::{ProductRecord, RunSummary};
use crate::output::ResultAggregator;
use crate::ConfigError;
use std::sync::Arc;
use std::time::Instant;

/// Hit outcomes for one fetched index page
struct HitBatch {
    page: u32,
    nb_hits: u64,
    nb_pages: u32,
    outcomes: Vec<Result<ProductRecord, TaskFailure>>,
}

/// Search index pipeline
pub struct MobileMasrPipeline<F = IndexFetcher> {
    fetcher: Arc<F>,
    extractor: Arc<HitExtractor>,
    scheduler: Scheduler,
    hits_per_page: u32,
}

impl MobileMasrPipeline<IndexFetcher> {
    /// Builds the pipeline
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::MissingCredentials)` - No index credentials; nothing was fetched
    pub fn from_config(
        config: &Config,
        credentials: Option<IndexCredentials>,
    ) -> Result<Self, ConfigError> {
        let fetcher = IndexFetcher::new(&config.mobilemasr, credentials)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }
}

impl<F> MobileMasrPipeline<F>
where
    F: PageFetcher<Target = IndexQuery, Content = SearchPage>,
{
    pub fn new(fetcher: Arc<F>, config: &Config) -> Self {
        let index = &config.mobilemasr;
        Self {
            fetcher,
            extractor: Arc::new(HitExtractor::new(&index.product_base_url, &index.location)),
            scheduler: Scheduler::new(
                index.concurrency as usize,
                RetryPolicy::from_config(&config.scraper),
            ),
            hits_per_page: index.hits_per_page,
        }
    }

    fn query(&self, request: &RunRequest, page: u32) -> IndexQuery {
        IndexQuery {
            query: request.query.trim().to_string(),
            page,
            hits_per_page: self.hits_per_page,
        }
    }

    /// Queries the index and returns the summary
    ///
    /// Never fails: if the first page cannot be fetched the summary is empty.
    pub async fn run(&self, request: &RunRequest) -> RunSummary {
        let started = Instant::now();
        let mut aggregator = ResultAggregator::new("MobileMasr", started);

        if request.is_search() {
            tracing::info!("[MobileMasr] Searching for '{}'", request.query.trim());
        }

        let first = self
            .scheduler
            .run_all(
                Arc::clone(&self.fetcher),
                vec![self.query(request, 0)],
                self.batch_handler(),
            )
            .await
            .pop();

        let first = match first {
            Some(Ok(batch)) => batch,
            _ => {
                tracing::error!("[MobileMasr] Failed to fetch the first index page");
                aggregator.record_discovery_failure();
                return aggregator.finish();
            }
        };

        let pages_to_fetch = request.max_pages.min(first.nb_pages);
        tracing::info!(
            "[MobileMasr] Found {} products across {} pages, fetching {}",
            first.nb_hits,
            first.nb_pages,
            pages_to_fetch.max(1)
        );
        absorb(&mut aggregator, first, pages_to_fetch);

        if pages_to_fetch > 1 {
            let queries: Vec<IndexQuery> = (1..pages_to_fetch)
                .map(|page| self.query(request, page))
                .collect();

            self.scheduler
                .run_each(
                    Arc::clone(&self.fetcher),
                    queries,
                    self.batch_handler(),
                    |outcome| match outcome {
                        Ok(batch) => absorb(&mut aggregator, batch, pages_to_fetch),
                        Err(_) => aggregator.record_discovery_failure(),
                    },
                )
                .await;
        }

        let summary = aggregator.finish();
        tracing::info!(
            "[MobileMasr] Scraped {} products in {:.1}s",
            summary.records.len(),
            summary.elapsed.as_secs_f64()
        );
        summary
    }

    /// Maps every hit of a fetched page inside the fetch task
    fn batch_handler(
        &self,
    ) -> impl Fn(&IndexQuery, SearchPage) -> Result<HitBatch, crate::ParseFailure> + Send + Sync + 'static
    {
        let extractor = Arc::clone(&self.extractor);
        move |query, page| {
            let outcomes = page
                .hits
                .iter()
                .enumerate()
                .map(|(i, hit)| {
                    extractor.extract_record(hit).map_err(|source| TaskFailure::Parse {
                        target: format!("hit {} of page {}", i, query.page),
                        source,
                    })
                })
                .collect();

            Ok(HitBatch {
                page: query.page,
                nb_hits: page.nb_hits,
                nb_pages: page.nb_pages,
                outcomes,
            })
        }
    }
}

fn absorb(aggregator: &mut ResultAggregator, batch: HitBatch, pages: u32) {
    tracing::info!(
        "[MobileMasr] Page {}/{}: got {} products",
        batch.page + 1,
        pages.max(1),
        batch.outcomes.len()
    );
    aggregator.expect(batch.outcomes.len());
    for outcome in batch.outcomes {
        aggregator.record(outcome);
    }
}
