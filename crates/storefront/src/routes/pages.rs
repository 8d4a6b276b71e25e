//! Server-rendered page handlers.
//!
//! Pages are thin shells: the frontend scripts load catalog, cart and blog
//! data from the JSON API using the base URLs exposed by [`SiteContext`].
//! Product and news detail pages render their title and description
//! server-side for search engines.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{instrument, warn};

use dental_com_core::{BlogPostId, BlogStatus, ProductId, format_money};

use crate::db::{BlogRepository, ProductRepository};
use crate::error::AppError;
use crate::filters;
use crate::models::blog::keywords_list;
use crate::models::media_url;
use crate::models::product::primary_image;
use crate::state::AppState;

/// Values every page hands to the frontend scripts.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub api_base_url: String,
    pub base_url: String,
    pub google_client_id: String,
}

impl SiteContext {
    fn from_state(state: &AppState) -> Self {
        let config = state.config();
        Self {
            api_base_url: config.api_base_url.clone(),
            base_url: config.base_url.clone(),
            google_client_id: config.google.client_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "home2.html")]
pub struct Home2Template {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "news.html")]
pub struct NewsTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub site: SiteContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub site: SiteContext,
}

/// Product fields rendered into the detail page.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: &'static str,
    pub price: String,
    /// Regular price when a sale is running.
    pub regular_price: Option<String>,
    pub image: Option<String>,
    pub image_alt: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "product_detail.html")]
pub struct ProductDetailTemplate {
    pub site: SiteContext,
    pub product: ProductSummary,
}

/// Blog post fields rendered into the news detail page.
#[derive(Debug, Clone)]
pub struct NewsSummary {
    pub id: BlogPostId,
    pub title: String,
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub published_on: String,
    pub image: Option<String>,
    pub content: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "news_detail.html")]
pub struct NewsDetailTemplate {
    pub site: SiteContext,
    pub post: NewsSummary,
}

/// The 404 page with a 404 status.
pub fn not_found_page(state: &AppState) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            site: SiteContext::from_state(state),
        },
    )
        .into_response()
}

/// The rendered page, the 404 page when the record is missing, or the error response.
fn page_or_404(state: &AppState, page: Result<Option<Response>, AppError>) -> Response {
    match page {
        Ok(Some(response)) => response,
        Ok(None) => not_found_page(state),
        Err(e) => {
            warn!(error = %e, "Failed to load page data");
            e.into_response()
        }
    }
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        site: SiteContext::from_state(&state),
    }
}

#[instrument(skip(state))]
pub async fn home2(State(state): State<AppState>) -> impl IntoResponse {
    Home2Template {
        site: SiteContext::from_state(&state),
    }
}

#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> impl IntoResponse {
    AboutTemplate {
        site: SiteContext::from_state(&state),
    }
}

#[instrument(skip(state))]
pub async fn shop(State(state): State<AppState>) -> impl IntoResponse {
    ShopTemplate {
        site: SiteContext::from_state(&state),
    }
}

#[instrument(skip(state))]
pub async fn contact(State(state): State<AppState>) -> impl IntoResponse {
    ContactTemplate {
        site: SiteContext::from_state(&state),
    }
}

#[instrument(skip(state))]
pub async fn news(State(state): State<AppState>) -> impl IntoResponse {
    NewsTemplate {
        site: SiteContext::from_state(&state),
    }
}

/// Cart page, also served at `/api/cart/template/`.
#[instrument(skip(state))]
pub async fn cart(State(state): State<AppState>) -> impl IntoResponse {
    CartTemplate {
        site: SiteContext::from_state(&state),
    }
}

#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> impl IntoResponse {
    CheckoutTemplate {
        site: SiteContext::from_state(&state),
    }
}

/// GET /404/
#[instrument(skip(state))]
pub async fn error_404(State(state): State<AppState>) -> Response {
    not_found_page(&state)
}

async fn product_summary(state: &AppState, raw_id: &str) -> Result<Option<ProductSummary>, AppError> {
    let Ok(id) = raw_id.parse::<i32>().map(ProductId::new) else {
        return Ok(None);
    };
    let repo = ProductRepository::new(state.pool());
    let Some(product) = repo.get(id).await?.filter(|p| p.is_active) else {
        return Ok(None);
    };
    let images = repo.images(id).await?;
    let primary = primary_image(&images);

    let current = product.current_price();
    Ok(Some(ProductSummary {
        id: product.id,
        name: product.name.clone(),
        description: product.description.clone(),
        category: product.category.label(),
        price: format_money(current),
        regular_price: (current < product.price).then(|| format_money(product.price)),
        image: primary.map(|img| media_url(state.media_url(), &img.image)),
        image_alt: primary.map_or_else(|| product.name.clone(), |img| img.alt_text.clone()),
    }))
}

/// Product detail page; unknown or inactive products get the 404 page.
///
/// GET /product/{id}/
#[instrument(skip(state))]
pub async fn product_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let page = product_summary(&state, &id).await.map(|summary| {
        summary.map(|product| {
            ProductDetailTemplate {
                site: SiteContext::from_state(&state),
                product,
            }
            .into_response()
        })
    });
    page_or_404(&state, page)
}

fn author_name(first: &str, last: &str, username: &str) -> String {
    let full = format!("{first} {last}");
    let full = full.trim();
    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}

async fn news_summary(state: &AppState, raw_id: &str) -> Result<Option<NewsSummary>, AppError> {
    let Ok(id) = raw_id.parse::<i32>().map(BlogPostId::new) else {
        return Ok(None);
    };
    let Some(post) = BlogRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|p| p.status == BlogStatus::Published)
    else {
        return Ok(None);
    };

    Ok(Some(NewsSummary {
        id: post.id,
        title: post.title.clone(),
        meta_title: post.meta_title.clone(),
        meta_description: post.meta_description.clone(),
        keywords: keywords_list(&post.meta_keywords),
        author: author_name(
            &post.author_first_name,
            &post.author_last_name,
            &post.author_username,
        ),
        published_on: post
            .published_at
            .unwrap_or(post.created_at)
            .format("%B %-d, %Y")
            .to_string(),
        image: post
            .image
            .as_deref()
            .map(|img| media_url(state.media_url(), img)),
        content: post.content,
    }))
}

/// News detail page; only published posts render.
///
/// GET /news/{id}/
#[instrument(skip(state))]
pub async fn news_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let page = news_summary(&state, &id).await.map(|summary| {
        summary.map(|post| {
            NewsDetailTemplate {
                site: SiteContext::from_state(&state),
                post,
            }
            .into_response()
        })
    });
    page_or_404(&state, page)
}

/// Router fallback: JSON 404 under `/api`, the 404 page elsewhere.
pub async fn fallback(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    if uri.path().starts_with("/api/") || uri.path() == "/api" {
        return AppError::not_found().into_response();
    }
    not_found_page(&state)
}

/// Create the page routes router.
///
/// Paths are registered without trailing slashes; the server trims them
/// before routing.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/home2", get(home2))
        .route("/about", get(about))
        .route("/shop", get(shop))
        .route("/contact", get(contact))
        .route("/news", get(news))
        .route("/product/{id}", get(product_detail))
        .route("/cart", get(cart))
        .route("/checkout", get(checkout))
        .route("/news/{id}", get(news_detail))
        .route("/404", get(error_404))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_name_falls_back_to_username() {
        assert_eq!(author_name("Ada", "Lovelace", "ada"), "Ada Lovelace");
        assert_eq!(author_name("", "", "admin"), "admin");
        assert_eq!(author_name("Ada", "", "ada"), "Ada");
    }
}
