//! Products, product images and reviews over HTTP.

#![allow(clippy::unwrap_used)]

use dental_com_integration_tests::{TestContext, json_with, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn create_product(ctx: &TestContext, body: Value) -> Value {
    let staff = ctx.staff().await;
    let resp = ctx
        .post("/api/products/")
        .bearer_auth(&staff.access)
        .json(&body)
        .send()
        .await
        .unwrap();
    json_with(resp, StatusCode::CREATED).await
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_create_then_fetch_product() {
    let ctx = TestContext::start().await;
    let name = unique("Night Guard");
    let created = create_product(
        &ctx,
        json!({
            "name": name,
            "description": "Custom fitted night guard.",
            "price": "89.00",
            "category": "orthodontics",
            "images": [
                { "image": "products/guard.jpg", "alt_text": "Guard", "is_primary": true },
                { "image": "products/guard-side.jpg" },
            ],
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(
        created["slug"],
        name.to_lowercase().replace(' ', "-").as_str()
    );

    let resp = ctx.get(&format!("/api/products/{id}/")).send().await.unwrap();
    let detail = json_with(resp, StatusCode::OK).await;
    assert_eq!(detail["images"].as_array().unwrap().len(), 2);
    assert_eq!(detail["primary_image"]["alt_text"], "Guard");
    assert_eq!(detail["on_sale"], false);

    let resp = ctx
        .get(&format!("/api/products/{id}/images/"))
        .send()
        .await
        .unwrap();
    let images = json_with(resp, StatusCode::OK).await;
    assert_eq!(images.as_array().unwrap().len(), 2);

    let resp = ctx.get(&format!("/product/{id}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(&name));
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_create_product_reports_field_errors() {
    let ctx = TestContext::start().await;
    let staff = ctx.staff().await;

    let resp = ctx
        .post("/api/products/")
        .bearer_auth(&staff.access)
        .json(&json!({ "name": "", "price": "-1", "category": "whitening" }))
        .send()
        .await
        .unwrap();
    let errors = json_with(resp, StatusCode::BAD_REQUEST).await;
    for field in ["name", "description", "price", "category"] {
        assert!(errors[field].is_array(), "missing error for {field}: {errors}");
    }
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_product_search_and_category_listing() {
    let ctx = TestContext::start().await;
    let marker = unique("Zircon").replace(' ', "");
    let created = create_product(
        &ctx,
        json!({
            "name": format!("{marker} Crown Kit"),
            "description": "Temporary crown kit.",
            "price": "19.99",
            "category": "restorative",
        }),
    )
    .await;

    let resp = ctx
        .get("/api/products/search/")
        .query(&[("q", marker.as_str())])
        .send()
        .await
        .unwrap();
    let page = json_with(resp, StatusCode::OK).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["id"], created["id"]);

    let resp = ctx
        .get("/api/products/")
        .query(&[("search", marker.as_str()), ("category", "restorative")])
        .send()
        .await
        .unwrap();
    let page = json_with(resp, StatusCode::OK).await;
    assert_eq!(page["count"], 1);

    let resp = ctx
        .get("/api/products/")
        .query(&[("category", "whitening")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .get("/api/products/category/whitening/")
        .send()
        .await
        .unwrap();
    let page = json_with(resp, StatusCode::OK).await;
    assert_eq!(page["count"], 0);

    let resp = ctx
        .get("/api/products/")
        .query(&[("page", "9999")])
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "Invalid page.");
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_delete_product_hides_it() {
    let ctx = TestContext::start().await;
    let staff = ctx.staff().await;
    let created = create_product(
        &ctx,
        json!({
            "name": unique("Retainer Case"),
            "description": "Vented case.",
            "price": "7.50",
            "category": "orthodontics",
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/api/products/{id}/")))
        .bearer_auth(&staff.access)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = ctx.get(&format!("/api/products/{id}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_review_flow() {
    let ctx = TestContext::start().await;
    let created = create_product(
        &ctx,
        json!({
            "name": unique("Water Flosser"),
            "description": "Cordless water flosser.",
            "price": "49.00",
            "category": "preventive",
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let username = unique("reviewer").replace(' ', "_");
    let email = format!("{username}@example.com");
    let review = json!({
        "rating": 4,
        "title": "Works well",
        "comment": "Gums feel better after a week.",
        "username": username,
        "email": email,
    });

    let resp = ctx
        .post(&format!("/api/products/{id}/reviews/"))
        .json(&review)
        .send()
        .await
        .unwrap();
    let created_review = json_with(resp, StatusCode::CREATED).await;
    let review_id = created_review["id"].as_i64().unwrap();
    assert_eq!(created_review["rating"], 4);
    assert_eq!(created_review["user"]["username"], username.as_str());

    // One active review per reviewer and product.
    let resp = ctx
        .post(&format!("/api/products/{id}/reviews/"))
        .json(&review)
        .send()
        .await
        .unwrap();
    let errors = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert!(errors["non_field_errors"].is_array());

    let helpful = format!("/api/products/{id}/reviews/{review_id}/helpful/");
    let resp = ctx.post(&helpful).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let voter = ctx.guest().await;
    let resp = ctx
        .post(&helpful)
        .bearer_auth(&voter.access)
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["helpful_count"], 1);

    let resp = ctx
        .get(&format!("/api/products/{id}/reviews/stats/"))
        .send()
        .await
        .unwrap();
    let stats = json_with(resp, StatusCode::OK).await;
    assert_eq!(stats["total_reviews"], 1);
    assert!((stats["average_rating"].as_f64().unwrap() - 4.0).abs() < f64::EPSILON);

    let resp = ctx
        .post(&format!("/api/products/{id}/reviews/"))
        .json(&json!({ "rating": 6, "username": "x", "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    let errors = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert!(errors["rating"].is_array());
    assert!(errors["email"].is_array());
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_only_one_primary_image_per_product() {
    let ctx = TestContext::start().await;
    let staff = ctx.staff().await;
    let created = create_product(
        &ctx,
        json!({
            "name": unique("Whitening Strips"),
            "description": "Fourteen day kit.",
            "price": "24.00",
            "category": "cosmetic",
            "images": [{ "image": "products/strips.jpg", "is_primary": true }],
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let first = created["images"][0]["id"].as_i64().unwrap();

    let resp = ctx
        .post(&format!("/api/products/{id}/images/"))
        .bearer_auth(&staff.access)
        .json(&json!({ "image": "products/strips-box.jpg", "is_primary": true }))
        .send()
        .await
        .unwrap();
    let second = json_with(resp, StatusCode::CREATED).await;
    assert_eq!(second["is_primary"], true);

    let resp = ctx
        .get(&format!("/api/products/{id}/images/"))
        .send()
        .await
        .unwrap();
    let images = json_with(resp, StatusCode::OK).await;
    let primaries: Vec<i64> = images
        .as_array()
        .unwrap()
        .iter()
        .filter(|img| img["is_primary"] == true)
        .map(|img| img["id"].as_i64().unwrap())
        .collect();
    assert_eq!(primaries, vec![second["id"].as_i64().unwrap()]);
    assert!(!primaries.contains(&first));
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_archived_review_is_hidden_then_restored() {
    let ctx = TestContext::start().await;
    let created = create_product(
        &ctx,
        json!({
            "name": unique("Tongue Scraper"),
            "description": "Stainless steel scraper.",
            "price": "6.00",
            "category": "preventive",
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let username = unique("patient").replace(' ', "_");
    let email = format!("{username}@example.com");

    let resp = ctx
        .post(&format!("/api/products/{id}/reviews/"))
        .json(&json!({
            "rating": 5,
            "title": "Fresh breath",
            "comment": "Use it every morning now.",
            "username": username,
            "email": email,
        }))
        .send()
        .await
        .unwrap();
    let review_id = json_with(resp, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap();
    let review_url = format!("/api/products/{id}/reviews/{review_id}/");

    let resp = ctx
        .client
        .delete(ctx.url(&review_url))
        .json(&json!({ "username": username, "email": email }))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["message"], "Review has been archived successfully");

    let resp = ctx.get(&review_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = ctx
        .get(&format!("/api/products/{id}/reviews/"))
        .send()
        .await
        .unwrap();
    let listing = json_with(resp, StatusCode::OK).await;
    assert_eq!(listing["statistics"]["total_reviews"], 0);
    assert!(listing["reviews"].as_array().unwrap().is_empty());
    let resp = ctx
        .get(&format!("/api/products/{id}/reviews/stats/"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_with(resp, StatusCode::OK).await["total_reviews"], 0);

    // Reviewing again brings the archived row back with the new content.
    let resp = ctx
        .post(&format!("/api/products/{id}/reviews/"))
        .json(&json!({
            "rating": 2,
            "title": "Changed my mind",
            "comment": "The edge is a bit sharp.",
            "username": username,
            "email": email,
        }))
        .send()
        .await
        .unwrap();
    let restored = json_with(resp, StatusCode::CREATED).await;
    assert_eq!(restored["id"].as_i64().unwrap(), review_id);
    assert_eq!(restored["rating"], 2);
    assert_eq!(restored["is_archived"], false);

    let resp = ctx.get(&review_url).send().await.unwrap();
    assert_eq!(json_with(resp, StatusCode::OK).await["title"], "Changed my mind");
}
