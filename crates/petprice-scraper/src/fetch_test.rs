use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn test_fetcher() -> PageFetcher {
    PageFetcher::new(5, "petprice-test/0.1").expect("failed to build test PageFetcher")
}

const PRODUCT_PAGE: &str =
    "<html><body><h1 class=\"product-meta__title\">Kibble</h1></body></html>";

#[tokio::test]
async fn fetch_returns_document_when_selector_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/kibble"))
        .and(header("Upgrade-Insecure-Requests", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_PAGE))
        .mount(&server)
        .await;

    let url = format!("{}/products/kibble", server.uri());
    let document = test_fetcher()
        .fetch(&url, "h1.product-meta__title", &[("Upgrade-Insecure-Requests", "1")])
        .await
        .unwrap()
        .expect("document");

    assert_eq!(document.url(), url);
    assert!(document.body().contains("Kibble"));
}

#[tokio::test]
async fn fetch_returns_none_when_selector_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><p>maintenance</p></html>"))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch(&server.uri(), "h1.product-meta__title", &[])
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_returns_none_on_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_fetcher().fetch(&server.uri(), "", &[]).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_returns_none_on_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PRODUCT_PAGE)
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(1, "petprice-test/0.1").unwrap();
    let result = fetcher.fetch(&server.uri(), "", &[]).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_errors_on_connection_failure() {
    // Nothing listens on port 9 locally.
    let result = test_fetcher().fetch("http://127.0.0.1:9/", "", &[]).await;
    assert!(matches!(result, Err(ScraperError::Http(_))), "got {result:?}");
}

#[tokio::test]
async fn fetch_rejects_invalid_selector() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_PAGE))
        .mount(&server)
        .await;

    let result = test_fetcher().fetch(&server.uri(), "h1[", &[]).await;
    assert!(matches!(result, Err(ScraperError::InvalidSelector { .. })));
}

#[tokio::test]
async fn fetch_json_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/kibble"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"variants": []}})))
        .mount(&server)
        .await;

    let url = format!("{}/products/kibble", server.uri());
    let value = test_fetcher()
        .fetch_json(&url, &[("Accept", "application/json")])
        .await
        .unwrap()
        .expect("json");
    assert_eq!(value["product"]["variants"], json!([]));
}

#[tokio::test]
async fn fetch_json_reports_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = test_fetcher().fetch_json(&server.uri(), &[]).await;
    assert!(matches!(result, Err(ScraperError::Deserialize { .. })));
}

#[tokio::test]
async fn fetch_json_returns_none_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = test_fetcher().fetch_json(&server.uri(), &[]).await.unwrap();
    assert!(result.is_none());
}
