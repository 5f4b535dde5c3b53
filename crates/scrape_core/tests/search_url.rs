use std::sync::Once;

use pretty_assertions::assert_eq;
use scrape_core::{build_search_url, SearchQuery, PRIME_FILTER};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scrape_logging::initialize_for_tests);
}

fn pairs(query: &SearchQuery) -> Vec<(String, String)> {
    build_search_url(query)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn defaults_to_canonical_market_and_all_departments() {
    init_logging();
    let query = SearchQuery {
        keyword: "headphones".into(),
        ..SearchQuery::default()
    };
    let url = build_search_url(&query).unwrap();
    assert_eq!(url.as_str(), "https://www.amazon.com/s?k=headphones&i=aps");
}

#[test]
fn maps_prices_and_category() {
    init_logging();
    let query = SearchQuery {
        keyword: "noise cancelling".into(),
        market: "www.amazon.de".into(),
        min_price: Some(10.0),
        max_price: Some(99.5),
        category: "electronics".into(),
        ..SearchQuery::default()
    };
    let url = build_search_url(&query).unwrap();
    assert_eq!(url.host_str(), Some("www.amazon.de"));
    assert_eq!(url.path(), "/s");
    assert_eq!(
        pairs(&query),
        vec![
            ("k".to_string(), "noise cancelling".to_string()),
            ("low-price".to_string(), "10".to_string()),
            ("high-price".to_string(), "99.5".to_string()),
            ("i".to_string(), "electronics".to_string()),
        ]
    );
}

#[test]
fn zero_prices_are_omitted() {
    init_logging();
    let query = SearchQuery {
        keyword: "cable".into(),
        min_price: Some(0.0),
        max_price: None,
        ..SearchQuery::default()
    };
    let keys: Vec<String> = pairs(&query).into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["k".to_string(), "i".to_string()]);
}

#[test]
fn prime_only_sets_refinement_filter() {
    init_logging();
    let query = SearchQuery {
        keyword: "mouse".into(),
        prime_only: true,
        ..SearchQuery::default()
    };
    let rh: Vec<String> = pairs(&query)
        .into_iter()
        .filter(|(k, _)| k == "rh")
        .map(|(_, v)| v)
        .collect();
    assert_eq!(rh, vec![PRIME_FILTER.to_string()]);
}

#[test]
fn market_with_scheme_is_normalized() {
    init_logging();
    let query = SearchQuery {
        keyword: "lamp".into(),
        market: " https://www.amazon.co.uk/ ".into(),
        ..SearchQuery::default()
    };
    let url = build_search_url(&query).unwrap();
    assert_eq!(url.as_str(), "https://www.amazon.co.uk/s?k=lamp&i=aps");
}

#[test]
fn invalid_market_is_a_configuration_error() {
    init_logging();
    let query = SearchQuery {
        keyword: "lamp".into(),
        market: "bad host".into(),
        ..SearchQuery::default()
    };
    assert!(build_search_url(&query).is_err());
}
