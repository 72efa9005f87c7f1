//! Integration tests for `ApifyScraper::scrape` against a mocked Apify API.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postplan_scraper::{ApifyScraper, ProfileScraper, ScrapeError};

const ACTOR: &str = "apify~instagram-profile-scraper";

fn test_scraper(server: &MockServer) -> ApifyScraper {
    ApifyScraper::new("test-token", &server.uri(), ACTOR, 5).expect("failed to build scraper")
}

fn run(status: &str) -> serde_json::Value {
    json!({"data": {"id": "run-1", "status": status, "defaultDatasetId": "ds-1"}})
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/acts/{ACTOR}/runs")))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "usernames": ["acme"],
            "resultsLimit": 10,
            "proxyConfig": {"useApifyProxy": true},
            "scrapeType": "posts"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(run("RUNNING")))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn scrape_returns_dataset_items_after_run_succeeds() {
    let server = MockServer::start().await;
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .and(query_param("waitForFinish", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run("SUCCEEDED")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"username": "acme", "latestPosts": [{"id": "1", "caption": "hi"}]}
        ])))
        .mount(&server)
        .await;

    let items = test_scraper(&server)
        .scrape("acme", 10)
        .await
        .expect("scrape should succeed")
        .expect("items should be present");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], "acme");
}

#[tokio::test]
async fn scrape_returns_none_for_empty_dataset() {
    let server = MockServer::start().await;
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run("SUCCEEDED")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = test_scraper(&server).scrape("acme", 10).await;

    assert!(matches!(result, Ok(None)), "got: {result:?}");
}

#[tokio::test]
async fn scrape_reports_failed_run() {
    let server = MockServer::start().await;
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run("ABORTED")))
        .mount(&server)
        .await;

    let result = test_scraper(&server).scrape("acme", 10).await;

    assert!(
        matches!(result, Err(ScrapeError::RunFailed { ref status, .. }) if status == "ABORTED"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn scrape_surfaces_api_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/acts/{ACTOR}/runs")))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let result = test_scraper(&server).scrape("acme", 10).await;

    assert!(
        matches!(result, Err(ScrapeError::Api { status: 401, ref message }) if message == "invalid token"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn scrape_reports_malformed_run_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/acts/{ACTOR}/runs")))
        .respond_with(ResponseTemplate::new(201).set_body_string("{not json"))
        .mount(&server)
        .await;

    let result = test_scraper(&server).scrape("acme", 10).await;

    assert!(
        matches!(result, Err(ScrapeError::Deserialize { ref context, .. }) if context == "actor run start"),
        "got: {result:?}"
    );
}
