//! Health checks, server-rendered pages and fallback handling.

#![allow(clippy::unwrap_used)]

use dental_com_integration_tests::{TestContext, json_with};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_health_endpoints() {
    let ctx = TestContext::start().await;

    let resp = ctx.get("/health").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx.get("/health/ready").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_security_headers_and_request_id() {
    let ctx = TestContext::start().await;

    let resp = ctx.get("/").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));
    assert!(
        headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_pages_accept_trailing_slash() {
    let ctx = TestContext::start().await;

    for path in ["/about/", "/shop", "/contact/", "/news", "/cart/", "/checkout"] {
        let resp = ctx.get(path).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_unknown_page_renders_not_found_template() {
    let ctx = TestContext::start().await;

    let resp = ctx.get("/no-such-page/").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.text().await.unwrap().contains("<html"));

    let resp = ctx.get("/product/not-a-number/").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_unknown_api_path_is_json() {
    let ctx = TestContext::start().await;

    let resp = ctx.get("/api/no-such-endpoint/").send().await.unwrap();
    let body = json_with(resp, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "Not found.");
}
