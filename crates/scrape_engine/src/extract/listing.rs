use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::{selector, ListingExtractor, ListingPage};
use crate::browser::PageContent;
use crate::ExtractError;

/// Reads the result grid of an Amazon search page.
///
/// Product links are canonicalized to `{origin}/dp/{asin}` so the same
/// product reached through different tracking URLs deduplicates.
#[derive(Debug)]
pub struct AmazonListingExtractor {
    items: Selector,
    title_link: Selector,
    next_page: Selector,
    link_asin: Regex,
}

impl AmazonListingExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            items: selector("div.s-result-item[data-asin]")?,
            title_link: selector("h2 a")?,
            next_page: selector(r#"a.s-pagination-next:not([aria-disabled="true"])"#)?,
            link_asin: Regex::new(r"(?i)/(?:dp|gp/product)/([A-Z0-9]{10})")
                .map_err(|err| ExtractError::new(err.to_string()))?,
        })
    }

    fn asin_of(&self, item: scraper::ElementRef<'_>) -> Option<String> {
        if let Some(asin) = item.value().attr("data-asin").map(str::trim) {
            if !asin.is_empty() {
                return Some(asin.to_string());
            }
        }
        let href = item.select(&self.title_link).next()?.value().attr("href")?;
        self.link_asin
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl ListingExtractor for AmazonListingExtractor {
    fn extract(&self, page: &PageContent) -> Result<Option<ListingPage>, ExtractError> {
        let base = Url::parse(&page.final_url)
            .map_err(|err| ExtractError::new(format!("page url {}: {err}", page.final_url)))?;
        let origin = base.origin().ascii_serialization();
        let doc = Html::parse_document(&page.html);

        let mut seen = HashSet::new();
        let mut product_links = Vec::new();
        for item in doc.select(&self.items) {
            let Some(asin) = self.asin_of(item) else {
                continue;
            };
            let link = format!("{origin}/dp/{asin}");
            if seen.insert(link.clone()) {
                product_links.push(link);
            }
        }

        let next_page_url = doc
            .select(&self.next_page)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.trim().is_empty())
            .and_then(|href| base.join(href.trim()).ok())
            .map(String::from);

        Ok(Some(ListingPage {
            product_links,
            next_page_url,
        }))
    }
}
