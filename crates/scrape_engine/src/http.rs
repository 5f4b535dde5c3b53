use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use scrape_logging::scrape_trace;

use crate::browser::{Browser, BrowsingContext, PageContent};
use crate::decode::decode_page;
use crate::{FailureKind, LoadError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: concat!("scrape_engine/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Browser backed by plain HTTP GETs. A page is "ready" once its body has
/// been fully downloaded and decoded.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: reqwest::Client,
    settings: Arc<FetchSettings>,
}

impl HttpBrowser {
    pub fn new(settings: FetchSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
        })
    }
}

#[async_trait::async_trait]
impl Browser for HttpBrowser {
    async fn open(&self, url: &str) -> Result<Box<dyn BrowsingContext>, LoadError> {
        let mut context = HttpContext {
            client: self.client.clone(),
            settings: self.settings.clone(),
            url: String::new(),
            closed: false,
        };
        context.navigate(url).await?;
        Ok(Box::new(context))
    }
}

struct HttpContext {
    client: reqwest::Client,
    settings: Arc<FetchSettings>,
    url: String,
    closed: bool,
}

impl HttpContext {
    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn fetch(&self) -> Result<PageContent, LoadError> {
        let url = self.url.as_str();
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| LoadError::new(FailureKind::InvalidUrl, url, err.to_string()))?;
        let host = parsed.host_str().map(str::to_string);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|err| map_reqwest_error(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::new(
                FailureKind::HttpStatus(status.as_u16()),
                url,
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(LoadError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    url,
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(LoadError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    url,
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(url, err))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(LoadError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    url,
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_page(&bytes, content_type.as_deref(), host.as_deref())
            .map_err(|err| LoadError::new(FailureKind::Decode, url, err.to_string()))?;
        scrape_trace!(
            "Loaded {} ({} bytes, {})",
            final_url,
            bytes.len(),
            decoded.encoding_label
        );

        Ok(PageContent {
            url: url.to_string(),
            final_url,
            html: decoded.html,
        })
    }
}

#[async_trait::async_trait]
impl BrowsingContext for HttpContext {
    async fn navigate(&mut self, url: &str) -> Result<(), LoadError> {
        if self.closed {
            return Err(LoadError::new(FailureKind::ContextClosed, url, "navigate after close"));
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> Result<PageContent, LoadError> {
        if self.closed {
            return Err(LoadError::new(
                FailureKind::ContextClosed,
                self.url.as_str(),
                "wait after close",
            ));
        }
        self.fetch().await
    }

    async fn close(&mut self) -> Result<(), LoadError> {
        self.closed = true;
        Ok(())
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> LoadError {
    if err.is_timeout() {
        return LoadError::new(FailureKind::Timeout, url, err.to_string());
    }
    if err.is_redirect() {
        return LoadError::new(FailureKind::RedirectLimitExceeded, url, err.to_string());
    }
    LoadError::new(FailureKind::Network, url, err.to_string())
}
