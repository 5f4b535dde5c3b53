//! Browsing contexts: isolated, disposable units that load a URL and expose
//! its rendered content to an extractor.

use crate::LoadError;

/// Rendered page handed to extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// URL that was requested.
    pub url: String,
    /// URL after redirects; relative links resolve against this.
    pub final_url: String,
    pub html: String,
}

impl PageContent {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            html: html.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait BrowsingContext: Send {
    /// Points the context at a new URL, reusing it in place.
    async fn navigate(&mut self, url: &str) -> Result<(), LoadError>;

    /// Resolves once the current page signals load completion.
    ///
    /// Callers bound this with their own timeout.
    async fn wait_until_ready(&mut self) -> Result<PageContent, LoadError>;

    /// Tears the context down. Called exactly once by the loader.
    async fn close(&mut self) -> Result<(), LoadError>;
}

#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh context that starts loading `url`.
    async fn open(&self, url: &str) -> Result<Box<dyn BrowsingContext>, LoadError>;
}
