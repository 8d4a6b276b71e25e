//! Guest sign-in, token handling and the cart lifecycle.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use dental_com_integration_tests::{TestContext, json_with, unique};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

async fn create_product(ctx: &TestContext, price: &str) -> i64 {
    let staff = ctx.staff().await;
    let resp = ctx
        .post("/api/products/")
        .bearer_auth(&staff.access)
        .json(&json!({
            "name": unique("Floss"),
            "description": "Waxed mint floss.",
            "price": price,
            "category": "preventive",
        }))
        .send()
        .await
        .unwrap();
    json_with(resp, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_guest_login_resumes_existing_session() {
    let ctx = TestContext::start().await;

    let session_id = unique("session").replace(' ', "-");
    let first = ctx
        .post("/api/auth/guest-login/")
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    let first = json_with(first, StatusCode::CREATED).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["user"]["is_guest"], true);

    let again = ctx
        .post("/api/auth/guest-login/")
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    let again = json_with(again, StatusCode::OK).await;
    assert_eq!(again["message"], "Guest session resumed");
    assert_eq!(again["data"]["user"]["id"], first["data"]["user"]["id"]);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_verify_and_refresh_tokens() {
    let ctx = TestContext::start().await;
    let guest = ctx.guest().await;

    let resp = ctx
        .post("/api/auth/verify-token/")
        .json(&json!({ "token": guest.access }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["data"]["user"]["username"], guest.username.as_str());

    let resp = ctx
        .post("/api/auth/refresh-token/")
        .json(&json!({ "refresh": guest.refresh }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert!(body["data"]["access"].as_str().is_some_and(|t| !t.is_empty()));

    // A refresh token is not an access token.
    let resp = ctx
        .post("/api/auth/verify-token/")
        .json(&json!({ "token": guest.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx
        .post("/api/auth/verify-token/")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Token is required");
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_cart_requires_authentication() {
    let ctx = TestContext::start().await;

    let resp = ctx.get("/api/cart/").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx
        .get("/api/cart/")
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_catalog_writes_require_staff() {
    let ctx = TestContext::start().await;
    let guest = ctx.guest().await;

    let resp = ctx
        .post("/api/products/")
        .bearer_auth(&guest.access)
        .json(&json!({ "name": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_cart_lifecycle() {
    let ctx = TestContext::start().await;
    let product_id = create_product(&ctx, "12.50").await;
    let guest = ctx.guest().await;

    let resp = ctx
        .get("/api/cart/")
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    let cart = json_with(resp, StatusCode::OK).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let resp = ctx
        .post("/api/cart/add/")
        .bearer_auth(&guest.access)
        .json(&json!({ "product_id": product_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::CREATED).await;
    assert_eq!(body["message"], "Item added to cart successfully");
    let item_id = body["cart"]["items"][0]["id"].as_i64().unwrap();
    assert_eq!(decimal(&body["cart"]["total_price"]), Decimal::new(2500, 2));

    // Adding the same product merges into the existing line.
    let resp = ctx
        .post("/api/cart/add/")
        .bearer_auth(&guest.access)
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["cart"]["items"][0]["quantity"], 3);

    let resp = ctx
        .post(&format!("/api/cart/decrease/{item_id}/"))
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["cart"]["items"][0]["quantity"], 2);

    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/cart/update/{item_id}/")))
        .bearer_auth(&guest.access)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert!(body["quantity"].is_array());

    let resp = ctx
        .get("/api/cart/item-count/")
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["total_quantity"], 2);

    // Another user cannot touch this line.
    let other = ctx.guest().await;
    let resp = ctx
        .post(&format!("/api/cart/increase/{item_id}/"))
        .bearer_auth(&other.access)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx
        .post("/api/cart/clear/")
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["cart"]["total_items"], 0);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_add_to_cart_rejects_unknown_product() {
    let ctx = TestContext::start().await;
    let guest = ctx.guest().await;

    let resp = ctx
        .post("/api/cart/add/")
        .bearer_auth(&guest.access)
        .json(&json!({ "product_id": 2_000_000_000 }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["product_id"][0], "Product not found.");
}
