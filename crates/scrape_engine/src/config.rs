use std::path::PathBuf;
use std::time::Duration;

use crate::export::PushSettings;
use crate::http::FetchSettings;
use crate::loader::DEFAULT_PAGE_LOAD_TIMEOUT;
use crate::rate_limiter::DEFAULT_MAX_DELAY;

pub const DEFAULT_OUTPUT_DIR: &str = "./exports";

/// Engine-side knobs that a request does not carry.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub page_load_timeout: Duration,
    /// Upper bound of the harvesting limiter's delay.
    pub max_delay: Duration,
    pub fetch: FetchSettings,
    pub push: PushSettings,
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            max_delay: DEFAULT_MAX_DELAY,
            fetch: FetchSettings::default(),
            push: PushSettings::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}
