use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use scrape_core::{ConfigError, ProductRecord};
use scrape_logging::{scrape_debug, scrape_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::observer::Reporter;
use crate::rate_limiter::AdaptiveRateLimiter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
    pub batch_size: usize,
    /// Flat pause between two batches.
    pub batch_delay: Duration,
    /// Extra attempts per batch after the first one fails.
    pub max_retries: u32,
    /// Starting pause before a retry; grows on every further failure.
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            batch_size: 20,
            batch_delay: Duration::from_millis(500),
            max_retries: 0,
            retry_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("could not build http client: {0}")]
    Client(reqwest::Error),
    #[error("batch {batch} could not be serialized: {source}")]
    Serialize {
        batch: usize,
        source: serde_json::Error,
    },
    #[error("batch {batch} transport failure: {message}")]
    Transport { batch: usize, message: String },
    #[error("batch {batch} rejected with status {status}")]
    Status { batch: usize, status: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushSummary {
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub records_sent: usize,
    /// The run was cancelled before every batch was attempted.
    pub cancelled: bool,
}

/// POSTs records as JSON arrays to a remote endpoint, batch by batch.
#[derive(Debug, Clone)]
pub struct ApiExporter {
    client: reqwest::Client,
    settings: PushSettings,
}

impl ApiExporter {
    pub fn new(settings: PushSettings) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(PushError::Client)?;
        Ok(Self { client, settings })
    }

    /// Sends every batch in order. A failed batch is logged and the next one
    /// is still attempted; only an unusable endpoint fails the whole push.
    pub async fn push(
        &self,
        endpoint: &str,
        token: Option<&str>,
        products: &[ProductRecord],
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<PushSummary, PushError> {
        let endpoint = parse_endpoint(endpoint)?;
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let size = self.settings.batch_size.max(1);
        let batch_count = products.len().div_ceil(size);
        let mut summary = PushSummary::default();

        for (index, batch) in products.chunks(size).enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let number = index + 1;
            reporter.log(format!(
                "Sending batch {number}/{batch_count} ({} products) to API...",
                batch.len()
            ));

            match self.send_with_retry(&endpoint, token, number, batch, cancel).await {
                Ok(()) => {
                    summary.batches_sent += 1;
                    summary.records_sent += batch.len();
                }
                Err(err) => {
                    scrape_warn!("Push to {} failed: {}", endpoint, err);
                    reporter.log(format!("API error: {err}"));
                    summary.batches_failed += 1;
                }
            }

            if number < batch_count && !self.settings.batch_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.settings.batch_delay) => {}
                }
            }
        }

        Ok(summary)
    }

    async fn send_with_retry(
        &self,
        endpoint: &Url,
        token: Option<&str>,
        batch: usize,
        records: &[ProductRecord],
        cancel: &CancellationToken,
    ) -> Result<(), PushError> {
        let body =
            serde_json::to_vec(records).map_err(|source| PushError::Serialize { batch, source })?;
        let pacing = AdaptiveRateLimiter::new(self.settings.retry_delay);

        let mut attempt = 0;
        loop {
            match self.send(endpoint, token, batch, body.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.settings.max_retries => {
                    attempt += 1;
                    scrape_debug!(
                        "Retrying batch {} ({}/{}) after {:?}: {}",
                        batch,
                        attempt,
                        self.settings.max_retries,
                        pacing.current_delay(),
                        err
                    );
                    if !pacing.wait_or_cancel(cancel).await {
                        return Err(err);
                    }
                    pacing.on_error();
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(
        &self,
        endpoint: &Url,
        token: Option<&str>,
        batch: usize,
        body: Vec<u8>,
    ) -> Result<(), PushError> {
        let mut request = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| PushError::Transport {
            batch,
            message: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status {
                batch,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::MissingEndpoint);
    }
    Url::parse(raw).map_err(|err| ConfigError::InvalidEndpoint(format!("{raw}: {err}")))
}
