use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use scrape_core::{ExportMode, Settings};
use scrape_engine::DEFAULT_OUTPUT_DIR;
use scrape_logging::{LogDestination, DEFAULT_LOG_FILE};

use crate::persistence::DEFAULT_SETTINGS_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportArg {
    Csv,
    Api,
}

impl From<ExportArg> for ExportMode {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Csv => ExportMode::Csv,
            ExportArg::Api => ExportMode::Api,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

/// Search Amazon listings and export product details as CSV or to an API.
///
/// Values not given on the command line come from the settings file, which
/// is updated with the effective values unless `--no-save` is set.
#[derive(Debug, Clone, Parser)]
#[command(name = "scrape", version, about)]
pub struct Cli {
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Search terms
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Marketplace host, e.g. www.amazon.de
    #[arg(long)]
    pub market: Option<String>,

    #[arg(long, value_name = "AMOUNT")]
    pub min_price: Option<f64>,

    #[arg(long, value_name = "AMOUNT")]
    pub max_price: Option<f64>,

    /// Department search alias
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub prime_only: Option<bool>,

    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub non_prime_only: Option<bool>,

    /// Listing pages to walk; 0 walks to the last page
    #[arg(long, value_name = "N")]
    pub max_pages: Option<u32>,

    /// Product pages to queue; 0 means no cap
    #[arg(long, value_name = "N")]
    pub max_products: Option<u32>,

    #[arg(long, value_name = "MS")]
    pub rate_limit_ms: Option<u64>,

    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    #[arg(long, value_enum)]
    pub export_mode: Option<ExportArg>,

    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    #[arg(long, value_name = "TOKEN")]
    pub api_token: Option<String>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log_to: LogTarget,

    #[arg(long, value_name = "FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Do not write the effective settings back to the settings file
    #[arg(long, default_value_t = false)]
    pub no_save: bool,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match self.log_to {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(self.log_file.clone()),
            LogTarget::Both => LogDestination::Both(self.log_file.clone()),
        }
    }

    /// Overlays every value given on the command line onto `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        let request = &mut settings.request;
        if let Some(keyword) = &self.keyword {
            request.keyword = keyword.clone();
        }
        if let Some(market) = &self.market {
            request.market = market.clone();
        }
        if self.min_price.is_some() {
            request.min_price = self.min_price;
        }
        if self.max_price.is_some() {
            request.max_price = self.max_price;
        }
        if let Some(category) = &self.category {
            request.category = category.clone();
        }
        if let Some(prime_only) = self.prime_only {
            request.prime_only = prime_only;
        }
        if let Some(non_prime_only) = self.non_prime_only {
            request.non_prime_only = non_prime_only;
        }
        if self.max_pages.is_some() {
            request.max_pages = self.max_pages;
        }
        if self.max_products.is_some() {
            request.max_products = self.max_products;
        }
        if let Some(rate_limit_ms) = self.rate_limit_ms {
            request.rate_limit_ms = rate_limit_ms;
        }
        if let Some(max_concurrent) = self.max_concurrent {
            request.max_concurrent = max_concurrent;
        }
        if let Some(mode) = self.export_mode {
            request.export_mode = mode.into();
        }
        if let Some(api_url) = &self.api_url {
            request.api_url = api_url.clone();
        }
        if let Some(api_token) = &self.api_token {
            request.api_token = api_token.clone();
        }
        if let Some(language) = &self.language {
            settings.language = language.clone();
        }
    }
}
