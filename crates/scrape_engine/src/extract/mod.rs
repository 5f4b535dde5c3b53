//! Extractors turn a loaded page into structured data.
mod listing;
mod product;

use scrape_core::ProductRecord;
use scraper::{ElementRef, Html, Selector};

use crate::browser::PageContent;
use crate::ExtractError;

pub use listing::AmazonListingExtractor;
pub use product::AmazonProductExtractor;

/// One search-result page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPage {
    pub product_links: Vec<String>,
    pub next_page_url: Option<String>,
}

pub trait ListingExtractor: Send + Sync {
    /// `Ok(None)` means the page yielded nothing and the walk should stop.
    fn extract(&self, page: &PageContent) -> Result<Option<ListingPage>, ExtractError>;
}

pub trait ProductExtractor: Send + Sync {
    /// `Ok(None)` means the page is not a product page.
    fn extract(&self, page: &PageContent) -> Result<Option<ProductRecord>, ExtractError>;
}

pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|err| ExtractError::new(format!("selector {css}: {err}")))
}

/// Parses a comma-free list of selectors, keeping their priority order.
pub(crate) fn selectors(list: &[&str]) -> Result<Vec<Selector>, ExtractError> {
    list.iter().map(|css| selector(css)).collect()
}

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn clean_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of the first selector that yields non-empty text.
pub(crate) fn first_text(doc: &Html, candidates: &[Selector]) -> String {
    candidates
        .iter()
        .flat_map(|sel| doc.select(sel))
        .map(clean_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}
