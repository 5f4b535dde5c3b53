//! Scrape core: pure data model, request validation and run lifecycle.
mod lifecycle;
mod progress;
mod query;
mod record;
mod request;
mod settings;

pub use lifecycle::{LifecycleError, RunStage};
pub use progress::{
    harvest_percent, NoopObserver, ProgressUpdate, RunObserver, PERCENT_DONE, PERCENT_EXPORTING,
    PERCENT_LISTED, PERCENT_SEARCHING,
};
pub use query::{build_search_url, SearchQuery, DEFAULT_CATEGORY, DEFAULT_MARKET, PRIME_FILTER};
pub use record::ProductRecord;
pub use request::{
    ConfigError, ExportMode, ExportTarget, RunPlan, ScrapeRequest, ScrapeResponse, DEFAULT_MAX_CONCURRENT,
    DEFAULT_RATE_LIMIT_MS,
};
pub use settings::{Settings, SettingsStore};
