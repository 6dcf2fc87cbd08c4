use crate::url::canonical_url;
use std::collections::HashSet;

/// Collapses discovered item URLs into a unique working set
///
/// URLs are compared in canonical form; URLs that cannot be canonicalized are
/// dropped. The result has no order.
pub fn dedupe<I, S>(urls: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    urls.into_iter()
        .filter_map(|url| {
            let canonical = canonical_url(url.as_ref());
            if canonical.is_none() {
                tracing::debug!("Dropping unusable item URL: {}", url.as_ref());
            }
            canonical
        })
        .collect()
}
