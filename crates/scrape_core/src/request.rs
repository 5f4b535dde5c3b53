use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::query::{build_search_url, SearchQuery};

pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportMode {
    #[default]
    #[serde(rename = "CSV", alias = "csv")]
    Csv,
    #[serde(rename = "API", alias = "api")]
    Api,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::Csv => write!(f, "CSV"),
            ExportMode::Api => write!(f, "API"),
        }
    }
}

/// The single message that starts a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeRequest {
    pub keyword: String,
    pub market: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub category: String,
    pub prime_only: bool,
    pub non_prime_only: bool,
    /// Listing pages to walk; `None` or `0` walks until the last page.
    pub max_pages: Option<u32>,
    /// Product URLs to queue; `None` or `0` means no cap.
    pub max_products: Option<u32>,
    pub rate_limit_ms: u64,
    pub max_concurrent: usize,
    pub export_mode: ExportMode,
    pub api_url: String,
    pub api_token: String,
}

impl Default for ScrapeRequest {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            market: String::new(),
            min_price: None,
            max_price: None,
            category: String::new(),
            prime_only: false,
            non_prime_only: false,
            max_pages: None,
            max_products: None,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            export_mode: ExportMode::Csv,
            api_url: String::new(),
            api_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub products_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("API URL is required for API export")]
    MissingEndpoint,
    #[error("invalid API URL {0}")]
    InvalidEndpoint(String),
    #[error("prime-only and non-prime-only filters cannot both be enabled")]
    ConflictingPrimeFilters,
    #[error("max concurrent must be at least 1")]
    ZeroConcurrency,
    #[error("invalid market {0}")]
    InvalidMarket(String),
    #[error("min price {min} exceeds max price {max}")]
    InvalidPriceRange { min: String, max: String },
}

/// Where the aggregate goes once harvesting is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Csv,
    Api { endpoint: Url, token: Option<String> },
}

/// A validated request, ready to be sequenced by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub query: SearchQuery,
    pub search_url: Url,
    pub max_pages: Option<usize>,
    pub max_products: Option<usize>,
    /// Flat delay between listing pages; zero disables it.
    pub page_delay: Duration,
    /// Starting delay of the adaptive limiter used while harvesting.
    pub product_delay: Duration,
    pub max_concurrent: usize,
    pub export: ExportTarget,
}

impl ScrapeRequest {
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            keyword: self.keyword.clone(),
            market: self.market.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            category: self.category.clone(),
            prime_only: self.prime_only,
            non_prime_only: self.non_prime_only,
        }
    }

    /// Checks every configuration constraint before any page is loaded.
    pub fn validate(&self) -> Result<RunPlan, ConfigError> {
        if self.prime_only && self.non_prime_only {
            return Err(ConfigError::ConflictingPrimeFilters);
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > 0.0 && max > 0.0 && min > max {
                return Err(ConfigError::InvalidPriceRange {
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }

        let export = match self.export_mode {
            ExportMode::Csv => ExportTarget::Csv,
            ExportMode::Api => {
                let raw = self.api_url.trim();
                if raw.is_empty() {
                    return Err(ConfigError::MissingEndpoint);
                }
                let endpoint = Url::parse(raw)
                    .map_err(|err| ConfigError::InvalidEndpoint(format!("{raw}: {err}")))?;
                let token = Some(self.api_token.trim())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                ExportTarget::Api { endpoint, token }
            }
        };

        let query = self.query();
        let search_url = build_search_url(&query)?;
        let product_delay = if self.rate_limit_ms == 0 {
            DEFAULT_RATE_LIMIT_MS
        } else {
            self.rate_limit_ms
        };

        Ok(RunPlan {
            query,
            search_url,
            max_pages: nonzero(self.max_pages),
            max_products: nonzero(self.max_products),
            page_delay: Duration::from_millis(self.rate_limit_ms),
            product_delay: Duration::from_millis(product_delay),
            max_concurrent: self.max_concurrent,
            export,
        })
    }
}

fn nonzero(value: Option<u32>) -> Option<usize> {
    value.filter(|v| *v > 0).map(|v| v as usize)
}
