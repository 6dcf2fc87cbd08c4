//! URL handling for discovered item links
//!
//! Item links are resolved against the site origin and canonicalized before
//! deduplication, so the same item reached through two listing pages counts once.

mod normalize;

pub use normalize::{canonical_url, resolve_link};
