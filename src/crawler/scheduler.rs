//! Bounded-concurrency task runner with per-task retry
//!
//! This module handles:
//! - Admission control via a semaphore (one permit per fetch attempt)
//! - Retrying failed attempts up to the task's budget with a fixed backoff
//! - Failure isolation: one task failing or panicking never affects siblings
//! - Delivering exactly one outcome per task to a single collection point

use crate::config::ScraperConfig;
use crate::fetch::{FetchTask, PageFetcher};
use crate::{FetchError, ParseFailure};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// How many times a task may be attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.retry_backoff_ms))
    }
}

/// Terminal failure of one task
#[derive(Debug, Error)]
pub enum TaskFailure {
    #[error("{target} failed after {attempts} attempt(s): {source}")]
    Exhausted {
        target: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("{target} could not be parsed: {source}")]
    Parse {
        target: String,
        #[source]
        source: ParseFailure,
    },

    #[error("task aborted: {0}")]
    Aborted(String),
}

/// Runs fetch tasks with at most `max_concurrency` attempts in flight
///
/// Listing and detail fetches use separate schedulers so each class gets its
/// own concurrency budget while sharing the retry contract.
#[derive(Debug, Clone)]
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    policy: RetryPolicy,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrency` - Maximum number of concurrent fetch attempts (at least 1)
    /// * `policy` - Attempt budget and backoff applied to every task
    pub fn new(max_concurrency: usize, policy: RetryPolicy) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            policy,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs every target and returns one outcome per target
    ///
    /// Outcomes are in completion order, not submission order.
    pub async fn run_all<F, T, H>(
        &self,
        fetcher: Arc<F>,
        targets: Vec<F::Target>,
        handler: H,
    ) -> Vec<Result<T, TaskFailure>>
    where
        F: PageFetcher,
        T: Send + 'static,
        H: Fn(&F::Target, F::Content) -> Result<T, ParseFailure> + Send + Sync + 'static,
    {
        let mut outcomes = Vec::with_capacity(targets.len());
        self.run_each(fetcher, targets, handler, |outcome| outcomes.push(outcome))
            .await;
        outcomes
    }

    /// Runs every target, passing each outcome to `collect` as soon as its task ends
    ///
    /// `collect` is the only place results are gathered; task bodies never
    /// touch shared state. `handler` turns fetched content into a value and
    /// runs inside the task; a parse failure ends the task without retrying.
    pub async fn run_each<F, T, H, C>(
        &self,
        fetcher: Arc<F>,
        targets: Vec<F::Target>,
        handler: H,
        mut collect: C,
    ) where
        F: PageFetcher,
        T: Send + 'static,
        H: Fn(&F::Target, F::Content) -> Result<T, ParseFailure> + Send + Sync + 'static,
        C: FnMut(Result<T, TaskFailure>),
    {
        let handler = Arc::new(handler);
        let mut tasks = JoinSet::new();

        for target in targets {
            let task = FetchTask::new(target, self.policy.max_attempts);
            let fetcher = Arc::clone(&fetcher);
            let handler = Arc::clone(&handler);
            let semaphore = Arc::clone(&self.semaphore);
            let backoff = self.policy.backoff;

            tasks.spawn(async move {
                run_task(task, fetcher, semaphore, backoff, &*handler).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Fetch task panicked: {}", e);
                    Err(TaskFailure::Aborted(e.to_string()))
                }
            };
            collect(outcome);
        }
    }
}

/// Drives one task through its attempts
async fn run_task<F, T, H>(
    mut task: FetchTask<F::Target>,
    fetcher: Arc<F>,
    semaphore: Arc<Semaphore>,
    backoff: Duration,
    handler: &H,
) -> Result<T, TaskFailure>
where
    F: PageFetcher,
    H: Fn(&F::Target, F::Content) -> Result<T, ParseFailure>,
{
    loop {
        task.attempt_count += 1;

        // Permit covers the attempt only, not the backoff
        let result = {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| TaskFailure::Aborted(e.to_string()))?;
            fetcher.fetch(&task.target).await
        };

        match result {
            Ok(content) => {
                tracing::trace!("Fetched {} on attempt {}", task.target, task.attempt_count);
                return handler(&task.target, content).map_err(|source| TaskFailure::Parse {
                    target: task.target.to_string(),
                    source,
                });
            }
            Err(e) if task.can_attempt() => {
                tracing::debug!(
                    "Attempt {}/{} for {} failed: {}",
                    task.attempt_count,
                    task.max_attempts,
                    task.target,
                    e
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::warn!(
                    "Giving up on {} after {} attempt(s): {}",
                    task.target,
                    task.attempt_count,
                    e
                );
                return Err(TaskFailure::Exhausted {
                    target: task.target.to_string(),
                    attempts: task.attempt_count,
                    source: e,
                });
            }
        }
    }
}
