//! Blog posts, counters and visibility rules.

#![allow(clippy::unwrap_used)]

use dental_com_integration_tests::{TestContext, json_with, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn create_post(ctx: &TestContext, title: &str, status: &str) -> Value {
    let resp = ctx
        .post("/api/blog/posts/")
        .json(&json!({
            "title": title,
            "description": "Why flossing matters.",
            "content": "Floss once a day.\nBrush twice.",
            "status": status,
            "meta_keywords": "floss, gums",
        }))
        .send()
        .await
        .unwrap();
    json_with(resp, StatusCode::CREATED).await
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_published_post_lifecycle() {
    let ctx = TestContext::start().await;
    let title = unique("Flossing 101");
    let post = create_post(&ctx, &title, "published").await;
    let id = post["id"].as_i64().unwrap();
    assert_eq!(post["status"], "published");
    assert!(post["published_at"].is_string());
    assert_eq!(post["meta_title"], title.as_str());
    assert_eq!(post["keywords_list"], json!(["floss", "gums"]));

    // Reading a post counts a view.
    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .send()
        .await
        .unwrap();
    let detail = json_with(resp, StatusCode::OK).await;
    assert_eq!(detail["view_count"], 1);

    for _ in 0..2 {
        let resp = ctx
            .post(&format!("/api/blog/posts/{id}/increment-like/"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = ctx
        .post(&format!("/api/blog/posts/{id}/decrement-like/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .patch(ctx.url(&format!("/api/blog/posts/{id}/")))
        .json(&json!({ "featured": true }))
        .send()
        .await
        .unwrap();
    let patched = json_with(resp, StatusCode::OK).await;
    assert_eq!(patched["featured"], true);
    assert_eq!(patched["number_of_likes"], 1);
    assert_eq!(patched["title"], title.as_str());

    let resp = ctx.get(&format!("/news/{id}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/api/blog/posts/{id}/")))
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::OK).await;
    assert_eq!(body["message"], "Blog post archived successfully");

    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_draft_is_hidden_from_anonymous_readers() {
    let ctx = TestContext::start().await;
    let post = create_post(&ctx, &unique("Draft Notes"), "draft").await;
    let id = post["id"].as_i64().unwrap();
    assert!(post["published_at"].is_null());

    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let guest = ctx.guest().await;
    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx.get(&format!("/news/{id}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_duplicate_title_conflicts_on_slug() {
    let ctx = TestContext::start().await;
    let title = unique("Whitening Myths");
    create_post(&ctx, &title, "published").await;

    let resp = ctx
        .post("/api/blog/posts/")
        .json(&json!({
            "title": title,
            "description": "Again.",
            "content": "Same title.",
        }))
        .send()
        .await
        .unwrap();
    let errors = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert!(errors["slug"].is_array());
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_search_and_list_filters() {
    let ctx = TestContext::start().await;
    let marker = unique("Enamel").replace(' ', "");
    let post = create_post(&ctx, &format!("{marker} Care"), "published").await;

    let resp = ctx
        .post("/api/blog/posts/search/")
        .json(&json!({ "query": marker }))
        .send()
        .await
        .unwrap();
    let found = json_with(resp, StatusCode::OK).await;
    assert_eq!(found["count"], 1);
    assert_eq!(found["results"][0]["id"], post["id"]);

    let resp = ctx
        .get("/api/blog/posts/")
        .query(&[("status", "bogus")])
        .send()
        .await
        .unwrap();
    let errors = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert!(errors["status"].is_array());

    let resp = ctx.get("/api/blog/categories/").send().await.unwrap();
    assert!(json_with(resp, StatusCode::OK).await.is_array());
    let resp = ctx.get("/api/blog/tags/").send().await.unwrap();
    assert!(json_with(resp, StatusCode::OK).await.is_array());
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_counter_on_missing_post_is_not_found() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .post("/api/blog/posts/2000000000/increment-view/")
        .send()
        .await
        .unwrap();
    let body = json_with(resp, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "Blog post not found");
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_like_count_never_goes_negative() {
    let ctx = TestContext::start().await;
    let post = create_post(&ctx, &unique("Gum Health"), "published").await;
    let id = post["id"].as_i64().unwrap();
    assert_eq!(post["number_of_likes"], 0);

    for _ in 0..2 {
        let resp = ctx
            .post(&format!("/api/blog/posts/{id}/decrement-like/"))
            .send()
            .await
            .unwrap();
        let body = json_with(resp, StatusCode::OK).await;
        assert_eq!(body["message"], "Like count decremented successfully");
    }

    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_with(resp, StatusCode::OK).await["number_of_likes"], 0);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_anonymous_counter_hands_post_to_admin() {
    let ctx = TestContext::start().await;
    let writer = ctx.guest().await;
    let resp = ctx
        .post("/api/blog/posts/")
        .bearer_auth(&writer.access)
        .json(&json!({
            "title": unique("Sensitive Teeth"),
            "description": "What causes sensitivity.",
            "content": "Enamel wear exposes dentin.",
            "status": "published",
        }))
        .send()
        .await
        .unwrap();
    let post = json_with(resp, StatusCode::CREATED).await;
    let id = post["id"].as_i64().unwrap();
    assert_eq!(post["author"]["username"], writer.username.as_str());

    // A signed-in reader leaves the author alone.
    let reader = ctx.guest().await;
    let resp = ctx
        .post(&format!("/api/blog/posts/{id}/increment-like/"))
        .bearer_auth(&reader.access)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .send()
        .await
        .unwrap();
    let detail = json_with(resp, StatusCode::OK).await;
    assert_eq!(detail["author"]["username"], writer.username.as_str());
    assert_eq!(detail["number_of_likes"], 1);

    let resp = ctx
        .post(&format!("/api/blog/posts/{id}/increment-view/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = ctx
        .get(&format!("/api/blog/posts/{id}/"))
        .send()
        .await
        .unwrap();
    let detail = json_with(resp, StatusCode::OK).await;
    assert_eq!(detail["author"]["username"], "admin");
    assert_eq!(detail["view_count"], 3);
}
