//! Canonical data types shared by both sources

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Value used for any optional field that could not be extracted
pub const UNAVAILABLE: &str = "N/A";

/// Canonical normalized product record
///
/// `source_url` is the identity of a record within a run. Attribute keys are
/// readable labels but are not a shared vocabulary across sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "product_name")]
    pub name: String,

    /// Free-form, currency-prefixed price text
    pub price: String,

    #[serde(rename = "seller_name")]
    pub seller: String,

    pub location: String,

    #[serde(rename = "listing_url")]
    pub source_url: String,

    /// Source-specific key/value pairs in first-seen order
    #[serde(rename = "details")]
    pub attributes: IndexMap<String, String>,
}

impl ProductRecord {
    /// Creates a record with every optional field set to the sentinel
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: UNAVAILABLE.to_string(),
            seller: UNAVAILABLE.to_string(),
            location: UNAVAILABLE.to_string(),
            source_url: source_url.into(),
            attributes: IndexMap::new(),
        }
    }
}

/// Outcome of one source run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Items that reached the extraction stage (item URLs or search hits)
    pub requested_count: usize,

    pub succeeded_count: usize,

    /// Items that exhausted retries or could not be parsed
    pub failed_count: usize,

    /// Records dropped because their `source_url` was already collected
    pub duplicates: usize,

    /// Listing or index pages that never produced content
    pub discovery_failures: usize,

    pub elapsed: Duration,

    pub records: Vec<ProductRecord>,
}

impl RunSummary {
    /// Records per second, or `None` when no time was measured
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            Some(self.records.len() as f64 / secs)
        } else {
            None
        }
    }

    /// Returns true if nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
