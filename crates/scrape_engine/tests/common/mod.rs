#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use scrape_core::ProductRecord;
use scrape_engine::{
    ArtifactSink, Browser, BrowsingContext, ExportError, ExtractError, FailureKind,
    ListingExtractor, ListingPage, LoadError, PageContent, ProductExtractor,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scrape_logging::initialize_for_tests);
}

#[derive(Debug, Clone)]
pub enum StubPage {
    Html(String),
    Status(u16),
    /// Never becomes ready.
    Hang,
}

#[derive(Default)]
struct StubState {
    pages: Mutex<HashMap<String, StubPage>>,
    load_delay: Mutex<Duration>,
    open: AtomicUsize,
    peak_open: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    visits: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
}

/// In-memory browser serving scripted pages and counting context lifetimes.
#[derive(Clone, Default)]
pub struct StubBrowser {
    state: Arc<StubState>,
}

impl StubBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, StubPage::Html(html.into()))
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.insert(url, StubPage::Status(status))
    }

    pub fn hang(self, url: &str) -> Self {
        self.insert(url, StubPage::Hang)
    }

    pub fn with_load_delay(self, delay: Duration) -> Self {
        *self.state.load_delay.lock().unwrap() = delay;
        self
    }

    fn insert(self, url: &str, page: StubPage) -> Self {
        self.state
            .pages
            .lock()
            .unwrap()
            .insert(url.to_string(), page);
        self
    }

    pub fn open_now(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    pub fn peak_open(&self) -> usize {
        self.state.peak_open.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.visits.lock().unwrap().clone()
    }

    /// `open <url>` and `close <url>` in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.state.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Browser for StubBrowser {
    async fn open(&self, url: &str) -> Result<Box<dyn BrowsingContext>, LoadError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.state.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_open.fetch_max(now, Ordering::SeqCst);
        self.state.events.lock().unwrap().push(format!("open {url}"));
        Ok(Box::new(StubContext {
            state: self.state.clone(),
            url: url.to_string(),
            closed: false,
        }))
    }
}

struct StubContext {
    state: Arc<StubState>,
    url: String,
    closed: bool,
}

#[async_trait::async_trait]
impl BrowsingContext for StubContext {
    async fn navigate(&mut self, url: &str) -> Result<(), LoadError> {
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> Result<PageContent, LoadError> {
        self.state.visits.lock().unwrap().push(self.url.clone());
        let delay = *self.state.load_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let page = self.state.pages.lock().unwrap().get(&self.url).cloned();
        match page {
            Some(StubPage::Html(html)) => Ok(PageContent::new(self.url.as_str(), html)),
            Some(StubPage::Status(code)) => Err(LoadError::new(
                FailureKind::HttpStatus(code),
                self.url.as_str(),
                "scripted failure",
            )),
            Some(StubPage::Hang) => std::future::pending().await,
            None => Err(LoadError::new(
                FailureKind::HttpStatus(404),
                self.url.as_str(),
                "no such page",
            )),
        }
    }

    async fn close(&mut self) -> Result<(), LoadError> {
        if !self.closed {
            self.closed = true;
            self.state.open.fetch_sub(1, Ordering::SeqCst);
            self.state.closed.fetch_add(1, Ordering::SeqCst);
            let event = format!("close {}", self.url);
            self.state.events.lock().unwrap().push(event);
        }
        Ok(())
    }
}

/// Listing pages written as lines of `link <url>` and `next <url>`.
pub struct LineListingExtractor;

impl ListingExtractor for LineListingExtractor {
    fn extract(&self, page: &PageContent) -> Result<Option<ListingPage>, ExtractError> {
        let mut listing = ListingPage::default();
        for line in page.html.lines() {
            match line.trim().split_once(' ') {
                Some(("link", url)) => listing.product_links.push(url.to_string()),
                Some(("next", url)) => listing.next_page_url = Some(url.to_string()),
                _ => {}
            }
        }
        if listing.product_links.is_empty() && listing.next_page_url.is_none() {
            return Ok(None);
        }
        Ok(Some(listing))
    }
}

pub fn listing_page(links: &[&str], next: Option<&str>) -> String {
    let mut body: Vec<String> = links.iter().map(|l| format!("link {l}")).collect();
    if let Some(next) = next {
        body.push(format!("next {next}"));
    }
    body.join("\n")
}

/// Product pages written as `key=value` lines. `broken` makes the extractor
/// fail; a page without `asin` yields nothing.
pub struct KeyValueProductExtractor;

impl ProductExtractor for KeyValueProductExtractor {
    fn extract(&self, page: &PageContent) -> Result<Option<ProductRecord>, ExtractError> {
        let mut record = ProductRecord {
            url: page.url.clone(),
            ..ProductRecord::default()
        };
        for line in page.html.lines() {
            let line = line.trim();
            if line == "broken" {
                return Err(ExtractError::new("unreadable product page"));
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "asin" => record.asin = value.to_string(),
                "title" => record.title = value.to_string(),
                "price" => record.price = value.to_string(),
                "currency" => record.currency = Some(value.to_string()),
                "prime" => record.prime = value == "true",
                "in_stock" => record.in_stock = value == "true",
                _ => {}
            }
        }
        if record.asin.is_empty() {
            return Ok(None);
        }
        Ok(Some(record))
    }
}

pub fn product_page(asin: &str, prime: bool) -> String {
    format!("asin={asin}\ntitle=Product {asin}\nprice=19.99\ncurrency=USD\nprime={prime}\nin_stock=true")
}

/// Keeps delivered artifacts in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    artifacts: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemorySink {
    pub fn artifacts(&self) -> Vec<(String, String)> {
        self.artifacts.lock().unwrap().clone()
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&self, filename: &str, content: &str) -> Result<String, ExportError> {
        self.artifacts
            .lock()
            .unwrap()
            .push((filename.to_string(), content.to_string()));
        Ok(format!("memory://{filename}"))
    }
}
