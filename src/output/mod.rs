//! Output module for run results
//!
//! This module handles:
//! - Aggregating item outcomes into a [`crate::RunSummary`]
//! - Writing result sets as JSON files
//! - Printing per-source reports

mod aggregator;
mod json;
pub mod stats;

pub use aggregator::ResultAggregator;
pub use json::{artifact_name, write_results, ResultFile};
pub use stats::{print_report, write_report};
