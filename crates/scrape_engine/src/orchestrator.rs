use std::sync::Arc;

use chrono::Utc;
use scrape_core::{
    ConfigError, ExportTarget, LifecycleError, ProductRecord, ProgressUpdate, RunObserver,
    RunPlan, RunStage, ScrapeRequest, ScrapeResponse, PERCENT_DONE, PERCENT_EXPORTING,
    PERCENT_LISTED, PERCENT_SEARCHING,
};
use scrape_logging::scrape_error;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::browser::Browser;
use crate::config::EngineConfig;
use crate::export::{
    export_filename, to_csv, ApiExporter, ArtifactSink, DirectoryArtifactSink, ExportError,
    PushError,
};
use crate::extract::{
    AmazonListingExtractor, AmazonProductExtractor, ListingExtractor, ProductExtractor,
};
use crate::harvest::{HarvestSettings, ProductHarvester};
use crate::http::HttpBrowser;
use crate::loader::PageLoader;
use crate::observer::Reporter;
use crate::walker::{ListingWalker, WalkLimits, WalkStop};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("run cancelled")]
    Cancelled,
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("engine setup failed: {0}")]
    Setup(String),
}

impl From<PushError> for RunError {
    fn from(err: PushError) -> Self {
        match err {
            PushError::Configuration(config) => RunError::Configuration(config),
            other => RunError::Export(ExportError::Push(other)),
        }
    }
}

/// Sequences search, listing walk, harvest and export for one request.
pub struct Orchestrator {
    browser: Arc<dyn Browser>,
    listing: Arc<dyn ListingExtractor>,
    product: Arc<dyn ProductExtractor>,
    sink: Arc<dyn ArtifactSink>,
    config: EngineConfig,
    reporter: Reporter,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        browser: Arc<dyn Browser>,
        listing: Arc<dyn ListingExtractor>,
        product: Arc<dyn ProductExtractor>,
        sink: Arc<dyn ArtifactSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            browser,
            listing,
            product,
            sink,
            config,
            reporter: Reporter::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// HTTP browser, HTML extractors and a directory sink under `config.output_dir`.
    pub fn with_defaults(config: EngineConfig) -> Result<Self, RunError> {
        let browser = HttpBrowser::new(config.fetch.clone())
            .map_err(|err| RunError::Setup(err.to_string()))?;
        let listing =
            AmazonListingExtractor::new().map_err(|err| RunError::Setup(err.to_string()))?;
        let product =
            AmazonProductExtractor::new().map_err(|err| RunError::Setup(err.to_string()))?;
        let sink = DirectoryArtifactSink::new(config.output_dir.clone());
        Ok(Self::new(
            Arc::new(browser),
            Arc::new(listing),
            Arc::new(product),
            Arc::new(sink),
            config,
        ))
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.reporter = Reporter::new(observer);
        self
    }

    /// Aborts the current run at its next suspension point. The token stays
    /// cancelled, so later runs on this orchestrator end immediately too.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, RunError> {
        let mut stage = RunStage::Idle;
        let result = self.run_stages(request, &mut stage).await;
        if let Err(err) = &result {
            scrape_error!("Run failed during {} stage: {}", stage, err);
            self.reporter.log(format!("Error: {err}"));
            if let Ok(next) = stage.advance(RunStage::Error) {
                self.reporter
                    .progress(ProgressUpdate::new(next, 0, 0, 0).with_note(err.to_string()));
            }
        }
        result
    }

    async fn run_stages(
        &self,
        request: &ScrapeRequest,
        stage: &mut RunStage,
    ) -> Result<ScrapeResponse, RunError> {
        let plan = request.validate()?;

        *stage = stage.advance(RunStage::Searching)?;
        self.reporter.log(format!("Starting scrape: {}", plan.search_url));
        self.reporter.progress(
            ProgressUpdate::new(*stage, 0, 0, PERCENT_SEARCHING).with_note("Search started"),
        );

        let loader =
            PageLoader::new(self.browser.clone()).with_timeout(self.config.page_load_timeout);

        *stage = stage.advance(RunStage::ListingWalk)?;
        let queue = self.walk_listings(&loader, &plan).await?;
        self.reporter
            .log(format!("Queued {} product pages.", queue.len()));
        self.reporter
            .progress(ProgressUpdate::new(*stage, 0, queue.len(), PERCENT_LISTED));

        *stage = stage.advance(RunStage::Harvesting)?;
        let products = self.harvest(&loader, &plan, &queue).await?;
        let count = products.len();
        self.reporter.log(format!(
            "Collected {count} products. Export mode: {}",
            request.export_mode
        ));

        *stage = stage.advance(RunStage::Exporting)?;
        self.reporter
            .progress(ProgressUpdate::new(*stage, count, count, PERCENT_EXPORTING));
        self.export(&plan, &products).await?;

        *stage = stage.advance(RunStage::Done)?;
        self.reporter.progress(
            ProgressUpdate::new(*stage, count, count, PERCENT_DONE).with_note("Finished"),
        );
        Ok(ScrapeResponse {
            products_count: count,
        })
    }

    async fn walk_listings(
        &self,
        loader: &PageLoader,
        plan: &RunPlan,
    ) -> Result<Vec<String>, RunError> {
        let limits = WalkLimits {
            max_pages: plan.max_pages,
            max_products: plan.max_products,
            page_delay: plan.page_delay,
        };
        let walk = ListingWalker::new(loader, self.listing.as_ref(), &self.reporter)
            .walk(plan.search_url.as_str(), &limits, &self.cancel)
            .await;
        if walk.stop == WalkStop::Cancelled {
            return Err(RunError::Cancelled);
        }
        Ok(walk.queue)
    }

    async fn harvest(
        &self,
        loader: &PageLoader,
        plan: &RunPlan,
        queue: &[String],
    ) -> Result<Vec<ProductRecord>, RunError> {
        let settings = HarvestSettings {
            product_delay: plan.product_delay,
            max_delay: self.config.max_delay,
            non_prime_only: plan.query.non_prime_only,
            max_concurrent: plan.max_concurrent,
        };
        let outcome = ProductHarvester::new(loader, self.product.as_ref(), &self.reporter)
            .harvest(queue, &settings, &self.cancel)
            .await;
        if outcome.cancelled {
            return Err(RunError::Cancelled);
        }
        Ok(outcome.products)
    }

    async fn export(&self, plan: &RunPlan, products: &[ProductRecord]) -> Result<(), RunError> {
        match &plan.export {
            ExportTarget::Csv => {
                let csv = to_csv(products)?;
                let filename = export_filename(&plan.query.keyword, Utc::now());
                let location = self.sink.deliver(&filename, &csv)?;
                self.reporter.log(format!("CSV written to {location}."));
            }
            ExportTarget::Api { endpoint, token } => {
                let exporter = ApiExporter::new(self.config.push.clone())?;
                let summary = exporter
                    .push(
                        endpoint.as_str(),
                        token.as_deref(),
                        products,
                        &self.reporter,
                        &self.cancel,
                    )
                    .await?;
                if summary.cancelled {
                    return Err(RunError::Cancelled);
                }
                self.reporter.log(format!(
                    "API export complete. {} batches sent, {} failed.",
                    summary.batches_sent, summary.batches_failed
                ));
            }
        }
        Ok(())
    }
}
