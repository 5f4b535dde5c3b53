use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scrape_core::{ConfigError, ExportMode, ExportTarget, ScrapeRequest, ScrapeResponse};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scrape_logging::initialize_for_tests);
}

#[test]
fn request_message_fills_defaults() {
    init_logging();
    let request: ScrapeRequest =
        serde_json::from_str(r#"{"keyword":"headphones","maxPages":2}"#).unwrap();
    assert_eq!(request.keyword, "headphones");
    assert_eq!(request.max_pages, Some(2));
    assert_eq!(request.rate_limit_ms, 1000);
    assert_eq!(request.max_concurrent, 3);
    assert_eq!(request.export_mode, ExportMode::Csv);
}

#[test]
fn export_mode_uses_upper_case_names() {
    init_logging();
    let request: ScrapeRequest = serde_json::from_str(
        r#"{"exportMode":"API","apiUrl":"https://sink.example.com/in","apiToken":"t0k"}"#,
    )
    .unwrap();
    assert_eq!(request.export_mode, ExportMode::Api);
    let plan = request.validate().unwrap();
    assert_eq!(
        plan.export,
        ExportTarget::Api {
            endpoint: "https://sink.example.com/in".parse().unwrap(),
            token: Some("t0k".to_string()),
        }
    );
}

#[test]
fn api_export_without_endpoint_fails_fast() {
    init_logging();
    let request = ScrapeRequest {
        export_mode: ExportMode::Api,
        api_url: "   ".into(),
        ..ScrapeRequest::default()
    };
    assert_eq!(request.validate().unwrap_err(), ConfigError::MissingEndpoint);
}

#[test]
fn conflicting_prime_filters_are_rejected() {
    init_logging();
    let request = ScrapeRequest {
        prime_only: true,
        non_prime_only: true,
        ..ScrapeRequest::default()
    };
    assert_eq!(
        request.validate().unwrap_err(),
        ConfigError::ConflictingPrimeFilters
    );
}

#[test]
fn zero_concurrency_is_rejected() {
    init_logging();
    let request = ScrapeRequest {
        max_concurrent: 0,
        ..ScrapeRequest::default()
    };
    assert_eq!(request.validate().unwrap_err(), ConfigError::ZeroConcurrency);
}

#[test]
fn inverted_price_range_is_rejected() {
    init_logging();
    let request = ScrapeRequest {
        min_price: Some(50.0),
        max_price: Some(20.0),
        ..ScrapeRequest::default()
    };
    assert!(matches!(
        request.validate(),
        Err(ConfigError::InvalidPriceRange { .. })
    ));
}

#[test]
fn zero_caps_mean_unlimited_and_zero_rate_keeps_limiter_default() {
    init_logging();
    let request = ScrapeRequest {
        keyword: "desk".into(),
        max_pages: Some(0),
        max_products: Some(0),
        rate_limit_ms: 0,
        ..ScrapeRequest::default()
    };
    let plan = request.validate().unwrap();
    assert_eq!(plan.max_pages, None);
    assert_eq!(plan.max_products, None);
    assert_eq!(plan.page_delay, Duration::ZERO);
    assert_eq!(plan.product_delay, Duration::from_millis(1000));
    assert_eq!(plan.export, ExportTarget::Csv);
}

#[test]
fn response_serializes_products_count() {
    init_logging();
    let json = serde_json::to_string(&ScrapeResponse { products_count: 5 }).unwrap();
    assert_eq!(json, r#"{"productsCount":5}"#);
}
