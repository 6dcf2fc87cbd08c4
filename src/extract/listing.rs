//! Item link discovery on listing and search result pages

use crate::url::resolve_link;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts item detail URLs from one listing page
///
/// # Link Extraction Rules
///
/// - Each `li[aria-label="Listing"]` contributes the first link of its first `<article>`
/// - If no such container exists, each bare `<article>` contributes its first link
/// - Links are resolved against the site origin
/// - Only links containing the item path marker are kept
///
/// A page without any matching structure yields an empty list, never an error.
#[derive(Debug, Clone)]
pub struct ListingParser {
    origin: Url,
    item_path: String,
    container: Selector,
    article: Selector,
    link: Selector,
}

impl ListingParser {
    /// Creates a parser for a site
    ///
    /// # Arguments
    ///
    /// * `origin` - Base URL relative links are resolved against
    /// * `item_path` - Marker every item URL contains (e.g. `/ad/`)
    pub fn new(origin: &str, item_path: &str) -> Result<Self, ConfigError> {
        let origin = Url::parse(origin)
            .map_err(|e| ConfigError::InvalidUrl(format!("origin '{}': {}", origin, e)))?;

        Ok(Self {
            origin,
            item_path: item_path.to_string(),
            container: compile(r#"li[aria-label="Listing"]"#)?,
            article: compile("article")?,
            link: compile("a[href]")?,
        })
    }

    /// Returns every item URL found on the page, in document order
    pub fn extract_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let mut articles: Vec<ElementRef> = document
            .select(&self.container)
            .filter_map(|item| item.select(&self.article).next())
            .collect();

        if articles.is_empty() {
            articles = document.select(&self.article).collect();
        }

        articles
            .into_iter()
            .filter_map(|article| article.select(&self.link).next())
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| resolve_link(href, &self.origin))
            .filter(|url| url.contains(&self.item_path))
            .collect()
    }
}

/// Compiles a CSS selector, reporting bad ones as configuration errors
pub(crate) fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::Validation(format!("invalid selector '{}': {:?}", selector, e)))
}
