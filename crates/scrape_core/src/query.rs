use url::Url;

use crate::ConfigError;

pub const DEFAULT_MARKET: &str = "www.amazon.com";
/// "All departments" search index.
pub const DEFAULT_CATEGORY: &str = "aps";
/// Refinement value that restricts results to Prime-eligible offers.
pub const PRIME_FILTER: &str = "p_85:2470955011";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    pub keyword: String,
    /// Market host, e.g. `www.amazon.de`. Empty means [`DEFAULT_MARKET`].
    pub market: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Department code. Empty means [`DEFAULT_CATEGORY`].
    pub category: String,
    pub prime_only: bool,
    pub non_prime_only: bool,
}

impl SearchQuery {
    /// Bare market host with any scheme, path or surrounding whitespace removed.
    pub fn market_host(&self) -> &str {
        let trimmed = self.market.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let host = without_scheme.split('/').next().unwrap_or(without_scheme);
        if host.is_empty() {
            DEFAULT_MARKET
        } else {
            host
        }
    }

    fn category_code(&self) -> &str {
        let trimmed = self.category.trim();
        if trimmed.is_empty() {
            DEFAULT_CATEGORY
        } else {
            trimmed
        }
    }
}

/// Builds the search-result URL for a query.
///
/// Parameter mapping: keyword → `k`, min/max price → `low-price`/`high-price`
/// (skipped when absent or zero), category → `i`, prime-only → `rh`.
pub fn build_search_url(query: &SearchQuery) -> Result<Url, ConfigError> {
    let host = query.market_host();
    let mut url = Url::parse(&format!("https://{host}/s"))
        .map_err(|err| ConfigError::InvalidMarket(format!("{host}: {err}")))?;

    let mut refinement: Option<String> = None;
    {
        let mut pairs = url.query_pairs_mut();
        let keyword = query.keyword.trim();
        if !keyword.is_empty() {
            pairs.append_pair("k", keyword);
        }
        if let Some(min) = query.min_price.filter(|p| *p > 0.0) {
            pairs.append_pair("low-price", &min.to_string());
        }
        if let Some(max) = query.max_price.filter(|p| *p > 0.0) {
            pairs.append_pair("high-price", &max.to_string());
        }
        pairs.append_pair("i", query.category_code());
    }

    if query.prime_only {
        let existing = url
            .query_pairs()
            .find(|(key, _)| key == "rh")
            .map(|(_, value)| value.into_owned());
        refinement = Some(match existing {
            Some(rh) if !rh.is_empty() => format!("{rh},{PRIME_FILTER}"),
            _ => PRIME_FILTER.to_string(),
        });
    }

    if let Some(rh) = refinement {
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "rh")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("rh", &rh);
    }

    Ok(url)
}
