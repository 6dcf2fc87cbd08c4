//! Field extraction from rendered item pages

use crate::extract::listing::compile;
use crate::model::{ProductRecord, UNAVAILABLE};
use crate::{ConfigError, ParseFailure};
use scraper::{ElementRef, Html, Selector};

/// CSS lookups for one item page layout
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub name: String,
    pub price: String,
    pub seller: String,
    /// Verified-seller container; only the first one on the page is searched
    pub verified_block: String,
    pub verified_seller: String,
    pub location: String,
    pub attribute_row: String,

    /// Text marking an unresolved profile link instead of a seller name
    pub seller_placeholder: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            name: "h1".to_string(),
            price: r#"span._24469da7[aria-label="Price"]"#.to_string(),
            seller: "span._8206696c.b7af14b4".to_string(),
            verified_block: "div._92439ac7".to_string(),
            verified_seller: "span._9a85fb36.b7af14b4".to_string(),
            location: r#"span[aria-label="Location"]"#.to_string(),
            attribute_row: "div._92439ac7 div._9a8eacd9".to_string(),
            seller_placeholder: "See profile".to_string(),
        }
    }
}

/// One way of finding a field; lookups are tried in order
type FieldLookup = fn(&PageExtractor, &Html) -> Option<String>;

/// Extracts a [`ProductRecord`] from an item page
///
/// Only the name is mandatory. Every other field falls back to `N/A`.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    name: Selector,
    price: Selector,
    seller: Selector,
    verified_block: Selector,
    verified_seller: Selector,
    location: Selector,
    attribute_row: Selector,
    span: Selector,
    seller_placeholder: String,
}

impl PageExtractor {
    /// Seller lookups: regular sellers first, then the verified-seller block
    const SELLER_CHAIN: &'static [FieldLookup] = &[Self::seller, Self::verified_seller];

    pub fn new(layout: &PageLayout) -> Result<Self, ConfigError> {
        Ok(Self {
            name: compile(&layout.name)?,
            price: compile(&layout.price)?,
            seller: compile(&layout.seller)?,
            verified_block: compile(&layout.verified_block)?,
            verified_seller: compile(&layout.verified_seller)?,
            location: compile(&layout.location)?,
            attribute_row: compile(&layout.attribute_row)?,
            span: compile("span")?,
            seller_placeholder: layout.seller_placeholder.clone(),
        })
    }

    /// Builds a record from one item page
    ///
    /// # Returns
    ///
    /// * `Ok(ProductRecord)` - The page had a usable name
    /// * `Err(ParseFailure::NoName)` - No name found; the record is dropped
    pub fn extract_record(&self, html: &str, source_url: &str) -> Result<ProductRecord, ParseFailure> {
        let document = Html::parse_document(html);

        let name = first_text(&document, &self.name)
            .ok_or_else(|| ParseFailure::NoName(source_url.to_string()))?;

        let mut record = ProductRecord::new(name, source_url);

        if let Some(price) = first_text(&document, &self.price) {
            record.price = price;
        }
        if let Some(seller) = self.lookup_chain(Self::SELLER_CHAIN, &document) {
            record.seller = seller;
        }
        if let Some(location) = first_text(&document, &self.location) {
            record.location = location;
        }

        for row in document.select(&self.attribute_row) {
            let mut spans = row.select(&self.span);
            if let (Some(key), Some(value)) = (spans.next(), spans.next()) {
                let key = stripped_text(key);
                if !key.is_empty() {
                    // IndexMap keeps the first-seen position and the latest value
                    record.attributes.insert(key, stripped_text(value));
                }
            }
        }

        Ok(record)
    }

    fn lookup_chain(&self, chain: &[FieldLookup], document: &Html) -> Option<String> {
        chain
            .iter()
            .filter_map(|lookup| lookup(self, document))
            .find(|value| !self.is_placeholder(value))
    }

    fn is_placeholder(&self, value: &str) -> bool {
        value == UNAVAILABLE || value.contains(self.seller_placeholder.as_str())
    }

    fn seller(&self, document: &Html) -> Option<String> {
        first_text(document, &self.seller)
    }

    fn verified_seller(&self, document: &Html) -> Option<String> {
        document
            .select(&self.verified_block)
            .next()?
            .select(&self.verified_seller)
            .next()
            .map(stripped_text)
            .filter(|s| !s.is_empty())
    }
}

/// Text of an element with each text node trimmed and concatenated
fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect::<String>()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(stripped_text)
        .filter(|s| !s.is_empty())
}
