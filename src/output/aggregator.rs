//! Collection of per-item outcomes into a run summary

use crate::crawler::TaskFailure;
use crate::model::{ProductRecord, RunSummary};
use std::collections::HashSet;
use std::time::Instant;

/// How often progress is logged, in completed items
const PROGRESS_INTERVAL: usize = 10;

/// Builds a [`RunSummary`] from task outcomes
///
/// Owned by the pipeline and fed from the scheduler's collection point, so it
/// needs no locking. Records whose `source_url` was already collected are
/// counted as duplicates and dropped.
#[derive(Debug)]
pub struct ResultAggregator {
    label: String,
    started: Instant,
    completed: usize,
    seen: HashSet<String>,
    summary: RunSummary,
}

impl ResultAggregator {
    /// Creates an aggregator; elapsed time is measured from `started`
    pub fn new(label: impl Into<String>, started: Instant) -> Self {
        Self {
            label: label.into(),
            started,
            completed: 0,
            seen: HashSet::new(),
            summary: RunSummary::default(),
        }
    }

    /// Adds items that will reach the extraction stage
    pub fn expect(&mut self, count: usize) {
        self.summary.requested_count += count;
    }

    /// Counts a listing or index page that never produced content
    pub fn record_discovery_failure(&mut self) {
        self.summary.discovery_failures += 1;
    }

    /// Records one item outcome
    pub fn record(&mut self, outcome: Result<ProductRecord, TaskFailure>) {
        self.completed += 1;

        match outcome {
            Ok(record) => {
                if self.seen.insert(record.source_url.clone()) {
                    self.summary.succeeded_count += 1;
                    self.summary.records.push(record);
                } else {
                    tracing::debug!("Duplicate record dropped: {}", record.source_url);
                    self.summary.duplicates += 1;
                }
            }
            Err(failure) => {
                tracing::warn!("[{}] {}", self.label, failure);
                self.summary.failed_count += 1;
            }
        }

        if self.completed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "[{}] Progress: {}/{} items done ({} records)",
                self.label,
                self.completed,
                self.summary.requested_count,
                self.summary.records.len()
            );
        }
    }

    /// Finalizes the summary, stamping the elapsed wall time
    pub fn finish(mut self) -> RunSummary {
        self.summary.elapsed = self.started.elapsed();
        self.summary
    }
}
