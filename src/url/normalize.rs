use url::Url;

/// Query parameters that never change which item a URL points at
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Canonicalizes an item URL so equivalent links compare equal
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the host (done by the parser)
/// 3. Remove the fragment
/// 4. Remove tracking query parameters
/// 5. Sort remaining query parameters; drop an empty query
///
/// Applying it twice gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use mobile_harvest::url::canonical_url;
///
/// let url = canonical_url("https://WWW.Example.com/ad/phone-1?utm_source=x#photos").unwrap();
/// assert_eq!(url, "https://www.example.com/ad/phone-1");
/// ```
pub fn canonical_url(url_str: &str) -> Option<String> {
    let mut url = Url::parse(url_str.trim()).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Some(url.to_string())
}

/// Resolves an href against the site origin
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only links
/// - links that don't resolve to HTTP(S)
pub fn resolve_link(href: &str, origin: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match origin.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
