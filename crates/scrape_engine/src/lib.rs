//! Scrape engine: page loading, pacing, harvesting and export.
mod browser;
mod config;
mod decode;
mod error;
mod export;
mod extract;
mod gate;
mod harvest;
mod http;
mod loader;
mod observer;
mod orchestrator;
mod persist;
mod rate_limiter;
mod walker;

pub use browser::{Browser, BrowsingContext, PageContent};
pub use config::{EngineConfig, DEFAULT_OUTPUT_DIR};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use error::{ExtractError, FailureKind, LoadError};
pub use export::{
    export_filename, normalize_field, to_csv, ApiExporter, ArtifactSink, DirectoryArtifactSink,
    ExportError, PushError, PushSettings, PushSummary, CSV_HEADERS, DEFAULT_CURRENCY,
};
pub use extract::{
    AmazonListingExtractor, AmazonProductExtractor, ListingExtractor, ListingPage,
    ProductExtractor,
};
pub use gate::{ConcurrencyGate, GatePermit, DEFAULT_CAPACITY};
pub use harvest::{batch_size, HarvestOutcome, HarvestSettings, ProductHarvester};
pub use http::{FetchSettings, HttpBrowser};
pub use loader::{PageLoader, PageSession, DEFAULT_PAGE_LOAD_TIMEOUT};
pub use observer::{ChannelObserver, Reporter, RunEvent};
pub use orchestrator::{Orchestrator, RunError};
pub use persist::{ensure_output_dir, write_atomic, PersistError};
pub use rate_limiter::{AdaptiveRateLimiter, RateLimiterState, DEFAULT_MAX_DELAY};
pub use walker::{ListingWalk, ListingWalker, UrlQueue, WalkLimits, WalkStop};
