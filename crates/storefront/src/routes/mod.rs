//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! Every path also answers with a trailing slash.
//!
//! ```text
//! # Pages
//! GET  /  /home2  /about  /shop  /contact  /news  /cart  /checkout  /404
//! GET  /product/{id}           - Product page (404 page when missing/inactive)
//! GET  /news/{id}              - News article (404 page unless published)
//! POST /mail                   - Contact/booking form
//!
//! # Auth API (strict rate limit)
//! POST /api/auth/guest-login
//! POST /api/auth/google-auth
//! POST /api/auth/verify-token
//! POST /api/auth/refresh-token
//!
//! # Catalog API
//! GET|POST             /api/products
//! GET                  /api/products/category/{category}
//! GET                  /api/products/search?q=
//! GET                  /api/products/stats
//! GET|PUT|PATCH|DELETE /api/products/{id}
//! GET|POST             /api/products/{product_id}/images
//! GET|PUT|PATCH|DELETE /api/products/{product_id}/images/{id}
//!
//! # Reviews API
//! GET|POST             /api/products/{product_id}/reviews
//! GET                  /api/products/{product_id}/reviews/stats
//! GET|PUT|PATCH|DELETE /api/products/{product_id}/reviews/{review_id}
//! POST                 /api/products/{product_id}/reviews/{review_id}/helpful
//! GET                  /api/reviews-list
//! GET                  /api/my-reviews
//!
//! # Cart API (requires auth)
//! GET    /api/cart  /api/cart/item-count  /api/cart/template
//! POST   /api/cart/add  /api/cart/clear
//! POST   /api/cart/increase/{id}  /api/cart/decrease/{id}
//! PUT    /api/cart/update/{id}
//! DELETE /api/cart/remove/{id}
//!
//! # Blog API
//! GET|POST             /api/blog/posts
//! POST                 /api/blog/posts/search
//! GET                  /api/blog/posts/featured
//! GET|PUT|PATCH|DELETE /api/blog/posts/{id}
//! POST                 /api/blog/posts/{id}/increment-view
//! POST                 /api/blog/posts/{id}/increment-like
//! POST                 /api/blog/posts/{id}/decrement-like
//! GET                  /api/blog/categories  /api/blog/tags
//!
//! # Clinic API
//! GET  /api/services
//! POST /api/appointments
//! ```

pub mod api;
pub mod contact;
pub mod pages;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth API router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/guest-login", post(api::auth::guest_login))
        .route("/google-auth", post(api::auth::google_auth))
        .route("/verify-token", post(api::auth::verify_token))
        .route("/refresh-token", post(api::auth::refresh_token))
}

/// Create the product, image and review routes router.
pub fn product_routes() -> Router<AppState> {
    use api::{product_images, products, reviews};

    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route("/category/{category}", get(products::products_by_category))
        .route("/search", get(products::search_products))
        .route("/stats", get(products::product_stats))
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .patch(products::patch_product)
                .delete(products::delete_product),
        )
        .route(
            "/{product_id}/images",
            get(product_images::list_images).post(product_images::create_image),
        )
        .route(
            "/{product_id}/images/{id}",
            get(product_images::get_image)
                .put(product_images::update_image)
                .patch(product_images::patch_image)
                .delete(product_images::delete_image),
        )
        .route(
            "/{product_id}/reviews",
            get(reviews::product_reviews).post(reviews::create_review),
        )
        .route("/{product_id}/reviews/stats", get(reviews::review_stats))
        .route(
            "/{product_id}/reviews/{review_id}",
            get(reviews::get_review)
                .put(reviews::update_review)
                .patch(reviews::patch_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/{product_id}/reviews/{review_id}/helpful",
            post(reviews::mark_helpful),
        )
}

/// Create the cart API router.
pub fn cart_routes() -> Router<AppState> {
    use api::cart;

    Router::new()
        .route("/", get(cart::get_cart))
        .route("/add", post(cart::add_to_cart))
        .route("/increase/{cart_item_id}", post(cart::increase_quantity))
        .route("/decrease/{cart_item_id}", post(cart::decrease_quantity))
        .route(
            "/update/{cart_item_id}",
            axum::routing::put(cart::update_quantity),
        )
        .route(
            "/remove/{cart_item_id}",
            axum::routing::delete(cart::remove_item),
        )
        .route("/clear", post(cart::clear_cart))
        .route("/item-count", get(cart::item_count))
        .route("/template", get(pages::cart))
}

/// Create the blog API router.
pub fn blog_routes() -> Router<AppState> {
    use api::blog;

    Router::new()
        .route("/posts", get(blog::list_posts).post(blog::create_post))
        .route("/posts/search", post(blog::search_posts))
        .route("/posts/featured", get(blog::featured_posts))
        .route(
            "/posts/{id}",
            get(blog::get_post)
                .put(blog::update_post)
                .patch(blog::patch_post)
                .delete(blog::delete_post),
        )
        .route("/posts/{id}/increment-view", post(blog::increment_view))
        .route("/posts/{id}/increment-like", post(blog::increment_like))
        .route("/posts/{id}/decrement-like", post(blog::decrement_like))
        .route("/categories", get(blog::list_categories))
        .route("/tags", get(blog::list_tags))
}

/// Create the JSON API router (everything under `/api` except auth).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/reviews-list", get(api::reviews::all_reviews))
        .route("/my-reviews", get(api::reviews::my_reviews))
        .nest("/cart", cart_routes())
        .nest("/blog", blog_routes())
        .route("/services", get(api::services::list_services))
        .route(
            "/appointments",
            post(api::appointments::create_appointment),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pages::router())
        .route(
            "/mail",
            post(contact::send_mail).fallback(contact::method_not_allowed),
        )
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/api", api_routes().layer(api_rate_limiter()))
        .fallback(pages::fallback)
}
