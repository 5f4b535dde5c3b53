use std::collections::HashSet;
use std::time::Duration;

use scrape_logging::scrape_warn;
use tokio_util::sync::CancellationToken;

use crate::extract::ListingExtractor;
use crate::loader::{PageLoader, PageSession};
use crate::observer::Reporter;

/// Deduplicated product-URL queue with an optional size cap.
#[derive(Debug, Clone, Default)]
pub struct UrlQueue {
    urls: Vec<String>,
    seen: HashSet<String>,
    cap: Option<usize>,
}

impl UrlQueue {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    pub fn is_full(&self) -> bool {
        self.cap.is_some_and(|cap| self.urls.len() >= cap)
    }

    /// Adds `url` unless it is a duplicate or the cap is reached.
    pub fn push(&mut self, url: String) -> bool {
        if self.is_full() || self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkLimits {
    pub max_pages: Option<usize>,
    pub max_products: Option<usize>,
    /// Flat pause after each page transition; zero disables it.
    pub page_delay: Duration,
}

/// Why the walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
    /// The extractor returned nothing for a page.
    NoResults,
    /// A listing page failed to load or extract.
    LoadFailed,
    PageLimit,
    LastPage,
    ProductLimit,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingWalk {
    pub queue: Vec<String>,
    pub pages_visited: usize,
    pub stop: WalkStop,
}

/// Paginates search results into the product queue, one page at a time.
pub struct ListingWalker<'a> {
    loader: &'a PageLoader,
    extractor: &'a dyn ListingExtractor,
    reporter: &'a Reporter,
}

impl<'a> ListingWalker<'a> {
    pub fn new(
        loader: &'a PageLoader,
        extractor: &'a dyn ListingExtractor,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            loader,
            extractor,
            reporter,
        }
    }

    pub async fn walk(
        &self,
        start_url: &str,
        limits: &WalkLimits,
        cancel: &CancellationToken,
    ) -> ListingWalk {
        let mut queue = UrlQueue::new(limits.max_products);
        let mut pages_visited = 0;

        let stop = match self.loader.session(start_url).await {
            Ok(mut session) => {
                let stop = self
                    .walk_pages(&mut session, &mut queue, &mut pages_visited, limits, cancel)
                    .await;
                session.close().await;
                stop
            }
            Err(err) => {
                scrape_warn!("Could not open listing page {}: {}", start_url, err);
                self.reporter.log(format!("Listing page failed: {err}"));
                WalkStop::LoadFailed
            }
        };

        ListingWalk {
            queue: queue.into_urls(),
            pages_visited,
            stop,
        }
    }

    async fn walk_pages(
        &self,
        session: &mut PageSession,
        queue: &mut UrlQueue,
        pages_visited: &mut usize,
        limits: &WalkLimits,
        cancel: &CancellationToken,
    ) -> WalkStop {
        let extractor = self.extractor;
        loop {
            if cancel.is_cancelled() {
                return WalkStop::Cancelled;
            }
            *pages_visited += 1;
            let page = *pages_visited;
            self.reporter.log(format!("Scraping listing page {page}..."));

            let listing = match session.extract(|content| extractor.extract(content)).await {
                Ok(Some(listing)) => listing,
                Ok(None) => return WalkStop::NoResults,
                Err(err) => {
                    scrape_warn!("Listing page {} failed: {}", page, err);
                    self.reporter.log(format!("Listing page {page} failed: {err}"));
                    return WalkStop::LoadFailed;
                }
            };

            let found = listing.product_links.len();
            for link in listing.product_links {
                if queue.is_full() {
                    break;
                }
                queue.push(link);
            }
            self.reporter.log(format!(
                "Found {found} products on page {page}. Queue size: {}.",
                queue.len()
            ));

            if limits.max_pages.is_some_and(|max| page >= max) {
                return WalkStop::PageLimit;
            }
            let Some(next) = listing.next_page_url else {
                return WalkStop::LastPage;
            };
            if queue.is_full() {
                return WalkStop::ProductLimit;
            }

            if let Err(err) = session.navigate(&next).await {
                scrape_warn!("Could not navigate to {}: {}", next, err);
                return WalkStop::LoadFailed;
            }
            if !limits.page_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return WalkStop::Cancelled,
                    _ = tokio::time::sleep(limits.page_delay) => {}
                }
            }
        }
    }
}
