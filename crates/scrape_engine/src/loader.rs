use std::sync::Arc;
use std::time::Duration;

use scrape_logging::{scrape_debug, scrape_warn};
use tokio_util::sync::CancellationToken;

use crate::browser::{Browser, BrowsingContext, PageContent};
use crate::{ExtractError, FailureKind, LoadError};

pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Visits URLs in isolated browsing contexts and runs extractors against them.
#[derive(Clone)]
pub struct PageLoader {
    browser: Arc<dyn Browser>,
    timeout: Duration,
}

impl PageLoader {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Opens a context on `url`, waits for it, extracts, and always disposes it.
    pub async fn load<T, F>(&self, url: &str, extract: F) -> Result<Option<T>, LoadError>
    where
        F: FnOnce(&PageContent) -> Result<Option<T>, ExtractError> + Send,
        T: Send,
    {
        let mut context = self.browser.open(url).await?;
        let result = ready_and_extract(context.as_mut(), self.timeout, url, extract).await;
        dispose(context.as_mut(), url).await;
        result
    }

    /// [`PageLoader::load`] that gives up once `cancel` fires, yielding `None`.
    /// An opened context is disposed either way.
    pub async fn load_until_cancelled<T, F>(
        &self,
        url: &str,
        extract: F,
        cancel: &CancellationToken,
    ) -> Option<Result<Option<T>, LoadError>>
    where
        F: FnOnce(&PageContent) -> Result<Option<T>, ExtractError> + Send,
        T: Send,
    {
        let mut context = tokio::select! {
            _ = cancel.cancelled() => return None,
            opened = self.browser.open(url) => match opened {
                Ok(context) => context,
                Err(err) => return Some(Err(err)),
            },
        };
        let result = tokio::select! {
            _ = cancel.cancelled() => None,
            result = ready_and_extract(context.as_mut(), self.timeout, url, extract) => Some(result),
        };
        dispose(context.as_mut(), url).await;
        result
    }

    /// Opens one context for sequential navigation. Close it with [`PageSession::close`].
    pub async fn session(&self, url: &str) -> Result<PageSession, LoadError> {
        let context = self.browser.open(url).await?;
        Ok(PageSession {
            context: Some(context),
            timeout: self.timeout,
            url: url.to_string(),
        })
    }
}

/// A single browsing context reused across navigations.
pub struct PageSession {
    context: Option<Box<dyn BrowsingContext>>,
    timeout: Duration,
    url: String,
}

impl PageSession {
    /// Waits for the current page and runs `extract` against it.
    pub async fn extract<T, F>(&mut self, extract: F) -> Result<Option<T>, LoadError>
    where
        F: FnOnce(&PageContent) -> Result<Option<T>, ExtractError> + Send,
        T: Send,
    {
        let url = self.url.clone();
        let timeout = self.timeout;
        let context = self.context_mut()?;
        ready_and_extract(context, timeout, &url, extract).await
    }

    /// Updates the context in place to point at `url`.
    pub async fn navigate(&mut self, url: &str) -> Result<(), LoadError> {
        self.context_mut()?.navigate(url).await?;
        self.url = url.to_string();
        Ok(())
    }

    /// Tears the context down; failures are logged and swallowed.
    pub async fn close(mut self) {
        if let Some(mut context) = self.context.take() {
            dispose(context.as_mut(), &self.url).await;
        }
    }

    fn context_mut(&mut self) -> Result<&mut (dyn BrowsingContext + 'static), LoadError> {
        match self.context.as_mut() {
            Some(context) => Ok(context.as_mut()),
            None => Err(LoadError::new(
                FailureKind::ContextClosed,
                self.url.as_str(),
                "session already closed",
            )),
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        if self.context.is_some() {
            scrape_warn!("Browsing context for {} dropped without close", self.url);
        }
    }
}

async fn ready_and_extract<T, F>(
    context: &mut dyn BrowsingContext,
    timeout: Duration,
    url: &str,
    extract: F,
) -> Result<Option<T>, LoadError>
where
    F: FnOnce(&PageContent) -> Result<Option<T>, ExtractError> + Send,
{
    let page = match tokio::time::timeout(timeout, context.wait_until_ready()).await {
        Ok(page) => page?,
        Err(_) => {
            return Err(LoadError::new(
                FailureKind::LoadTimeout { after: timeout },
                url,
                "page did not finish loading",
            ))
        }
    };
    extract(&page).map_err(|err| LoadError::new(FailureKind::Extraction, url, err.0))
}

async fn dispose(context: &mut dyn BrowsingContext, url: &str) {
    if let Err(err) = context.close().await {
        scrape_debug!("Ignoring teardown failure for {}: {}", url, err);
    }
}
