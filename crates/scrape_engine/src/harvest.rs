use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use scrape_core::{harvest_percent, ProductRecord, ProgressUpdate, RunStage};
use scrape_logging::{scrape_debug, scrape_warn};
use tokio_util::sync::CancellationToken;

use crate::extract::ProductExtractor;
use crate::gate::ConcurrencyGate;
use crate::loader::PageLoader;
use crate::observer::Reporter;
use crate::rate_limiter::{AdaptiveRateLimiter, DEFAULT_MAX_DELAY};

const MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Starting delay of the run's adaptive limiter.
    pub product_delay: Duration,
    pub max_delay: Duration,
    pub non_prime_only: bool,
    pub max_concurrent: usize,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            product_delay: Duration::from_millis(scrape_core::DEFAULT_RATE_LIMIT_MS),
            max_delay: DEFAULT_MAX_DELAY,
            non_prime_only: false,
            max_concurrent: scrape_core::DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Aggregate of one harvest. `products` is in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestOutcome {
    pub products: Vec<ProductRecord>,
    pub processed: usize,
    pub filtered: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub final_delay: Duration,
}

/// Items dispatched together; twice the concurrency, never more than ten.
pub fn batch_size(max_concurrent: usize) -> usize {
    max_concurrent.saturating_mul(2).clamp(1, MAX_BATCH_SIZE)
}

enum ItemOutcome {
    Collected(ProductRecord),
    Filtered,
    Empty,
    Failed,
    Skipped,
}

struct BatchContext<'r> {
    limiter: &'r AdaptiveRateLimiter,
    gate: &'r ConcurrencyGate,
    processed: &'r AtomicUsize,
    total: usize,
    non_prime_only: bool,
    cancel: &'r CancellationToken,
}

/// Drains the product queue under the concurrency gate and adaptive limiter.
pub struct ProductHarvester<'a> {
    loader: &'a PageLoader,
    extractor: &'a dyn ProductExtractor,
    reporter: &'a Reporter,
}

impl<'a> ProductHarvester<'a> {
    pub fn new(
        loader: &'a PageLoader,
        extractor: &'a dyn ProductExtractor,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            loader,
            extractor,
            reporter,
        }
    }

    pub async fn harvest(
        &self,
        urls: &[String],
        settings: &HarvestSettings,
        cancel: &CancellationToken,
    ) -> HarvestOutcome {
        let limiter = AdaptiveRateLimiter::with_max_delay(settings.product_delay, settings.max_delay);
        let gate = ConcurrencyGate::new(settings.max_concurrent);
        let processed = AtomicUsize::new(0);
        let ctx = BatchContext {
            limiter: &limiter,
            gate: &gate,
            processed: &processed,
            total: urls.len(),
            non_prime_only: settings.non_prime_only,
            cancel,
        };

        let size = batch_size(settings.max_concurrent);
        let batch_count = urls.len().div_ceil(size);
        let mut outcome = HarvestOutcome::default();

        for (index, batch) in urls.chunks(size).enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            self.reporter.log(format!(
                "Processing batch {}/{} ({} products)",
                index + 1,
                batch_count,
                batch.len()
            ));

            let mut in_flight: FuturesUnordered<_> =
                batch.iter().map(|url| self.scrape_one(url, &ctx)).collect();
            while let Some(item) = in_flight.next().await {
                match item {
                    ItemOutcome::Collected(record) => outcome.products.push(record),
                    ItemOutcome::Filtered => outcome.filtered += 1,
                    ItemOutcome::Failed => outcome.failed += 1,
                    ItemOutcome::Empty | ItemOutcome::Skipped => {}
                }
            }

            self.reporter.log(format!(
                "Current delay: {}ms",
                limiter.current_delay().as_millis()
            ));
        }

        if cancel.is_cancelled() {
            outcome.cancelled = true;
        }
        if outcome.filtered > 0 {
            self.reporter.log(format!(
                "Filtered out {} Prime products (Non-Prime only mode).",
                outcome.filtered
            ));
        }
        outcome.processed = processed.load(Ordering::SeqCst);
        outcome.final_delay = limiter.current_delay();
        outcome
    }

    async fn scrape_one(&self, url: &str, ctx: &BatchContext<'_>) -> ItemOutcome {
        let current = ctx.processed.fetch_add(1, Ordering::SeqCst) + 1;
        self.reporter.progress(ProgressUpdate::new(
            RunStage::Harvesting,
            current,
            ctx.total,
            harvest_percent(current, ctx.total),
        ));

        let permit = ctx.gate.acquire().await;
        if ctx.cancel.is_cancelled() {
            permit.release();
            return ItemOutcome::Skipped;
        }

        let extractor = self.extractor;
        let loaded = self
            .loader
            .load_until_cancelled(url, |page| extractor.extract(page), ctx.cancel)
            .await;
        let Some(result) = loaded else {
            permit.release();
            return ItemOutcome::Skipped;
        };
        match &result {
            Ok(_) => ctx.limiter.on_success(),
            Err(_) => ctx.limiter.on_error(),
        }
        ctx.limiter.wait_or_cancel(ctx.cancel).await;
        permit.release();

        match result {
            Ok(Some(record)) if ctx.non_prime_only && record.prime => {
                self.reporter
                    .log(format!("Filtered out Prime product: {}", record.label()));
                ItemOutcome::Filtered
            }
            Ok(Some(record)) => ItemOutcome::Collected(record),
            Ok(None) => {
                scrape_debug!("No product data at {}", url);
                ItemOutcome::Empty
            }
            Err(err) => {
                scrape_warn!("Product page {} failed: {}", url, err);
                self.reporter.log(format!("Failed product scrape: {err}"));
                ItemOutcome::Failed
            }
        }
    }
}
