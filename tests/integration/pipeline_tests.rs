//! Integration tests for both harvesting pipelines
//!
//! These tests use wiremock to stand in for the marketplace and the search
//! index, and run the full harvester end-to-end with the HTTP engine.

use mobile_harvest::config::{BrowserEngine, Config, IndexCredentials};
use mobile_harvest::crawler::{Harvester, RunRequest, Source};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration pointing both sources at the mock server
fn create_test_config(server: &MockServer, output_dir: &TempDir) -> Config {
    let base = server.uri();
    let mut config = Config::default();

    config.scraper.engine = BrowserEngine::Http;
    config.scraper.retry_backoff_ms = 0;
    config.scraper.settle_ms = 0;
    config.scraper.render_settle_ms = 0;
    config.scraper.reload_settle_ms = 0;
    config.scraper.page_load_timeout_secs = 5;

    config.dubizzle.base_url = format!("{}/mobile-phones/", base);
    config.dubizzle.origin = base.clone();

    config.mobilemasr.endpoint = base;
    config.mobilemasr.product_base_url = "https://mobilemasr.com/en/product".to_string();

    config.output.directory = output_dir.path().display().to_string();
    config
}

fn credentials() -> Option<IndexCredentials> {
    Some(IndexCredentials {
        app_id: "TESTAPP".to_string(),
        api_key: "TESTKEY".to_string(),
    })
}

/// Pads a document past the minimum content length
fn page(body: &str) -> String {
    format!(
        "<html><head><title>t</title></head><body>{}<!-- {} --></body></html>",
        body,
        "x".repeat(1200)
    )
}

fn listing_page(ids: &[&str]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li aria-label="Listing"><article><a href="/en/ad/{}.html">{}</a></article></li>"#,
                id, id
            )
        })
        .collect();
    page(&format!("<ul>{}</ul>", items))
}

fn item_page(name: &str, seller: &str) -> String {
    page(&format!(
        r#"<h1>{}</h1>
        <span class="_24469da7" aria-label="Price">EGP 20,000</span>
        <span class="_8206696c b7af14b4">{}</span>
        <span aria-label="Location">Maadi, Cairo</span>
        <div class="_92439ac7">
            <div class="_9a8eacd9"><span>Brand</span><span>Apple</span></div>
            <div class="_9a8eacd9"><span>Condition</span><span>Used</span></div>
        </div>"#,
        name, seller
    ))
}

async fn mount_listing(server: &MockServer, page_no: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/mobile-phones/"))
        .and(query_param("page", page_no))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/en/ad/{}.html", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rendered_pipeline_end_to_end() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_listing(&server, "1", listing_page(&["a", "b"])).await;
    mount_listing(&server, "2", listing_page(&["b", "c", "short"])).await;
    mount_item(&server, "a", item_page("iPhone 12", "Ahmed")).await;
    mount_item(&server, "b", item_page("iPhone 13", "See profile")).await;
    mount_item(&server, "c", item_page("Galaxy S21", "Mona")).await;
    // Too short on every attempt
    mount_item(&server, "short", "<h1>Tiny</h1>".to_string()).await;

    let config = create_test_config(&server, &output);
    let harvester = Harvester::new(&config, &[Source::Dubizzle], None).unwrap();
    let reports = harvester.run(&RunRequest::full_catalog(2)).await;

    assert_eq!(reports.len(), 1);
    let summary = &reports[0].summary;
    assert_eq!(summary.requested_count, 4);
    assert_eq!(summary.records.len(), 3);
    assert_eq!(summary.failed_count, 1);

    let seller_b = summary
        .records
        .iter()
        .find(|r| r.name == "iPhone 13")
        .map(|r| r.seller.clone());
    assert_eq!(seller_b.as_deref(), Some("N/A"));

    let path = reports[0].output_path.as_ref().expect("results should be saved");
    assert!(path.ends_with("dubizzle_products.json"));

    let body = std::fs::read_to_string(path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["total_products"], 3);
    assert_eq!(parsed["products"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["products"][0]["details"]["Brand"], "Apple");
    assert_eq!(parsed["products"][0]["location"], "Maadi, Cairo");
}

#[tokio::test]
async fn test_transient_listing_page_is_reloaded_once() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // First response is the error page; the reload gets the real listing
    Mock::given(method("GET"))
        .and(path("/mobile-phones/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Something went wrong")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_listing(&server, "1", listing_page(&["a"])).await;
    mount_item(&server, "a", item_page("Pixel 7", "Omar")).await;

    let config = create_test_config(&server, &output);
    let harvester = Harvester::new(&config, &[Source::Dubizzle], None).unwrap();
    let reports = harvester.run(&RunRequest::full_catalog(1)).await;

    assert_eq!(reports[0].summary.records.len(), 1);
    assert_eq!(reports[0].summary.records[0].name, "Pixel 7");
}

#[tokio::test]
async fn test_search_mode_file_name_and_urls() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/mobile-phones/q-iphone-13/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["s1"])))
        .mount(&server)
        .await;
    mount_item(&server, "s1", item_page("iPhone 13", "Sara")).await;

    let config = create_test_config(&server, &output);
    let harvester = Harvester::new(&config, &[Source::Dubizzle], None).unwrap();
    let reports = harvester
        .run(&RunRequest::search("iPhone 13", 1))
        .await;

    let path = reports[0].output_path.as_ref().unwrap();
    assert!(path.ends_with("iphone_13_results.json"));
}

#[tokio::test]
async fn test_no_listings_writes_no_file() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_listing(&server, "1", page("<p>No results</p>")).await;

    let config = create_test_config(&server, &output);
    let harvester = Harvester::new(&config, &[Source::Dubizzle], None).unwrap();
    let reports = harvester.run(&RunRequest::full_catalog(1)).await;

    assert!(reports[0].summary.is_empty());
    assert!(reports[0].output_path.is_none());
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_index_pipeline_end_to_end() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let hit = |slug: &str, price: u32| {
        serde_json::json!({
            "slug_en": slug,
            "brand_en": "Apple",
            "item_en": "iPhone 12",
            "storage_en": "128GB",
            "sale_price": price,
            "vendor_storename": "Masr Store"
        })
    };

    Mock::given(method("POST"))
        .and(path("/1/indexes/Variant_new_index/query"))
        .and(wiremock::matchers::body_partial_json(serde_json::json!({"page": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nbHits": 3,
            "nbPages": 2,
            "hits": [hit("iphone-12-a", 15000), hit("iphone-12-b", 16500)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1/indexes/Variant_new_index/query"))
        .and(wiremock::matchers::body_partial_json(serde_json::json!({"page": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nbHits": 3,
            "nbPages": 2,
            "hits": [hit("iphone-12-c", 1200000), {"brand_en": "no id"}]
        })))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &output);
    let harvester = Harvester::new(&config, &[Source::MobileMasr], credentials()).unwrap();
    let reports = harvester.run(&RunRequest::full_catalog(10)).await;

    let summary = &reports[0].summary;
    assert_eq!(summary.requested_count, 4);
    assert_eq!(summary.records.len(), 3);
    assert_eq!(summary.failed_count, 1);

    let prices: Vec<&str> = {
        let mut p: Vec<&str> = summary.records.iter().map(|r| r.price.as_str()).collect();
        p.sort_unstable();
        p
    };
    assert_eq!(prices, vec!["EGP 1,200,000", "EGP 15,000", "EGP 16,500"]);
    assert!(summary.records.iter().all(|r| r.seller == "Masr Store"));
    assert!(summary.records.iter().all(|r| r.location == "Egypt"));

    let path = reports[0].output_path.as_ref().unwrap();
    assert!(path.ends_with("mobilemasr_products.json"));
}

#[tokio::test]
async fn test_combined_run_needs_credentials_up_front() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let config = create_test_config(&server, &output);
    let result = Harvester::new(&config, &Source::ALL, None);
    assert!(result.is_err());

    // Nothing was requested from either backend
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_slashed_query_saves_both_sources() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/mobile-phones/q-iphone-13/14/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["q1"])))
        .mount(&server)
        .await;
    mount_item(&server, "q1", item_page("iPhone 13", "Sara")).await;

    Mock::given(method("POST"))
        .and(path("/1/indexes/Variant_new_index/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nbHits": 1,
            "nbPages": 1,
            "hits": [{"slug_en": "iphone-14", "brand_en": "Apple", "item_en": "iPhone 14"}]
        })))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &output);
    let harvester = Harvester::new(&config, &Source::ALL, credentials()).unwrap();
    let reports = harvester.run(&RunRequest::search("iPhone 13/14", 1)).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].summary.records.len(), 1);
    assert_eq!(reports[1].summary.records.len(), 1);

    let dubizzle_path = reports[0].output_path.as_ref().expect("dubizzle results saved");
    let index_path = reports[1].output_path.as_ref().expect("index results saved");
    assert!(dubizzle_path.ends_with("iphone_13_14_results.json"));
    assert!(index_path.ends_with("mobilemasr_iphone_13_14_results.json"));
    assert_eq!(dubizzle_path.parent(), Some(output.path()));
    assert_eq!(index_path.parent(), Some(output.path()));
}
