//! Harvesting pipelines and their orchestration
//!
//! This module contains the core fetch-parse-normalize logic, including:
//! - Bounded-concurrency scheduling with per-task retry
//! - URL deduplication
//! - One pipeline per source
//! - The [`Harvester`], which runs the selected sources and saves their results

mod dedupe;
mod dubizzle;
mod mobilemasr;
mod scheduler;

pub use dedupe::dedupe;
pub use dubizzle::{seed_urls, DubizzlePipeline};
pub use mobilemasr::MobileMasrPipeline;
pub use scheduler::{RetryPolicy, Scheduler, TaskFailure};

use crate::config::{validate, Config, IndexCredentials};
use crate::model::RunSummary;
use crate::output::{artifact_name, write_results};
use crate::{ConfigError, HarvestError};
use std::fmt;
use std::path::PathBuf;

/// A backend products are harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Rendered marketplace pages
    Dubizzle,
    /// Structured search index
    MobileMasr,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Dubizzle, Source::MobileMasr];
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Dubizzle => f.write_str("Dubizzle"),
            Source::MobileMasr => f.write_str("MobileMasr"),
        }
    }
}

/// What to harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Search term; empty means the full catalog
    pub query: String,

    /// Upper bound on listing / index pages
    pub max_pages: u32,
}

impl RunRequest {
    pub fn full_catalog(max_pages: u32) -> Self {
        Self {
            query: String::new(),
            max_pages,
        }
    }

    pub fn search(query: impl Into<String>, max_pages: u32) -> Self {
        Self {
            query: query.into(),
            max_pages,
        }
    }

    pub fn is_search(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Outcome of one source within a run
#[derive(Debug)]
pub struct SourceReport {
    pub source: Source,
    pub summary: RunSummary,

    /// Where the results were written; `None` when nothing was found
    pub output_path: Option<PathBuf>,
}

/// Runs the selected sources one after another
pub struct Harvester {
    sources: Vec<Source>,
    dubizzle: Option<DubizzlePipeline>,
    mobilemasr: Option<MobileMasrPipeline>,
    output_dir: PathBuf,
}

impl Harvester {
    /// Validates the configuration and builds every pipeline the plan needs
    ///
    /// All construction happens here, so a missing credential aborts a
    /// combined run before any source starts fetching.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `sources` - Sources to run, in order; duplicates are ignored
    /// * `credentials` - Search index credentials, required for MobileMasr
    pub fn new(
        config: &Config,
        sources: &[Source],
        credentials: Option<IndexCredentials>,
    ) -> Result<Self, ConfigError> {
        validate(config)?;

        let mut plan = Vec::new();
        for source in sources {
            if !plan.contains(source) {
                plan.push(*source);
            }
        }
        if plan.is_empty() {
            return Err(ConfigError::Validation("no source selected".to_string()));
        }

        let dubizzle = if plan.contains(&Source::Dubizzle) {
            Some(DubizzlePipeline::from_config(config)?)
        } else {
            None
        };
        let mobilemasr = if plan.contains(&Source::MobileMasr) {
            Some(MobileMasrPipeline::from_config(config, credentials)?)
        } else {
            None
        };

        Ok(Self {
            sources: plan,
            dubizzle,
            mobilemasr,
            output_dir: PathBuf::from(&config.output.directory),
        })
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Runs every planned source and saves non-empty results
    ///
    /// Returns one report per source, in plan order. A result file that cannot
    /// be written is logged and leaves `output_path` empty; later sources still run.
    pub async fn run(&self, request: &RunRequest) -> Vec<SourceReport> {
        let mut reports = Vec::with_capacity(self.sources.len());

        for &source in &self.sources {
            tracing::info!("Starting {} ({} pages max)", source, request.max_pages);

            let summary = match source {
                Source::Dubizzle => match &self.dubizzle {
                    Some(pipeline) => pipeline.run(request).await,
                    None => continue,
                },
                Source::MobileMasr => match &self.mobilemasr {
                    Some(pipeline) => pipeline.run(request).await,
                    None => continue,
                },
            };

            let output_path = if summary.is_empty() {
                tracing::warn!(
                    "{}",
                    HarvestError::EmptyResult {
                        source_name: source.to_string()
                    }
                );
                None
            } else {
                let file_name = artifact_name(source, &request.query);
                match write_results(&self.output_dir, &file_name, &summary.records) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::error!("Could not save {} results: {}", source, e);
                        None
                    }
                }
            };

            reports.push(SourceReport {
                source,
                summary,
                output_path,
            });
        }

        reports
    }
}
