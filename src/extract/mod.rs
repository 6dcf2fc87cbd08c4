//! Content extraction for both sources
//!
//! This module contains:
//! - [`ListingParser`]: item URL discovery on listing pages
//! - [`PageExtractor`]: records from rendered item pages
//! - [`HitExtractor`]: records from structured search hits
//!
//! Extraction never panics on unexpected content. Missing optional fields
//! become `N/A`; a missing name or identifier is a [`crate::ParseFailure`].

mod detail;
mod hit;
mod listing;

pub use detail::{PageExtractor, PageLayout};
pub use hit::{format_price, HitExtractor};
pub use listing::ListingParser;
