//! Product catalog API.

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use dental_com_core::{ProductCategory, ProductId, simple_slug};

use super::pagination::{PageParams, PageRequest, PageUrl, Paginated};
use super::validation::{self, money, optional_text, text};
use super::{JsonBody, PathParams, QueryParams, double_option, parse_bool};
use crate::db::products::{ImageInput, ProductFilter, ProductInput, ProductSort};
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::RequireStaff;
use crate::models::product::{
    Product, ProductDetail, ProductImage, ProductListItem, ProductStats, ProductWriteView,
    primary_image,
};
use crate::state::AppState;

const NAME_MAX: usize = 200;
const SLUG_MAX: usize = 200;
const ALT_TEXT_MAX: usize = 200;
const IMAGE_PATH_MAX: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Product create/update body. Every field is optional so PATCH can share it.
#[derive(Debug, Default, Deserialize)]
pub struct ProductWriteRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub on_sale: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_end: Option<Option<DateTime<Utc>>>,
    pub is_featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_top_rated: Option<bool>,
    pub images: Option<Vec<ImageRequest>>,
}

/// One image in a product body, or the body of the image endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ImageRequest {
    pub image: Option<String>,
    pub alt_text: Option<String>,
    pub is_primary: Option<bool>,
}

impl ImageRequest {
    /// Validate, falling back to `existing` for absent optional fields.
    ///
    /// The path is required unless this is a PATCH of a stored image.
    /// Errors are recorded under `field`.
    pub(super) fn validate(
        self,
        errors: &mut FieldErrors,
        field: &str,
        existing: Option<&ProductImage>,
        partial: bool,
    ) -> Option<ImageInput> {
        let required = !partial || existing.is_none();
        let image = text(errors, field, self.image, Some(IMAGE_PATH_MAX), required)
            .or_else(|| existing.map(|img| img.image.clone()));
        let alt_text = optional_text(errors, field, self.alt_text, ALT_TEXT_MAX)
            .or_else(|| existing.map(|img| img.alt_text.clone()))
            .unwrap_or_default();
        let is_primary = self
            .is_primary
            .or_else(|| existing.map(|img| img.is_primary))
            .unwrap_or(false);
        Some(ImageInput {
            image: image?,
            alt_text,
            is_primary,
        })
    }
}

/// A validated product body.
#[derive(Debug)]
pub struct ValidProduct {
    pub input: ProductInput,
    pub images: Option<Vec<ImageInput>>,
}

impl ProductWriteRequest {
    /// Validate into complete column values.
    ///
    /// With `existing`, absent fields keep the stored value when `partial`
    /// (PATCH); a full update (PUT) still requires the required fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every invalid field.
    pub fn validate(self, existing: Option<&Product>, partial: bool) -> Result<ValidProduct> {
        let mut errors = FieldErrors::new();
        let base = existing.map(ProductInput::from);
        let required = !partial || base.is_none();

        let name = text(&mut errors, "name", self.name, Some(NAME_MAX), required)
            .or_else(|| base.as_ref().map(|b| b.name.clone()));
        let description = text(&mut errors, "description", self.description, None, required)
            .or_else(|| base.as_ref().map(|b| b.description.clone()));
        let price = match self.price {
            Some(price) => money(&mut errors, "price", price),
            None if required => {
                errors.add("price", validation::REQUIRED);
                None
            }
            None => base.as_ref().map(|b| b.price),
        };
        let category: Option<ProductCategory> =
            validation::choice(&mut errors, "category", self.category, required)
                .or_else(|| base.as_ref().map(|b| b.category));
        let sale_price = match self.sale_price {
            Some(Some(value)) => money(&mut errors, "sale_price", value).map(Some),
            Some(None) => Some(None),
            None => Some(base.as_ref().and_then(|b| b.sale_price)),
        };
        let slug = optional_text(&mut errors, "slug", self.slug, SLUG_MAX);

        let images = self.images.map(|images| {
            images
                .into_iter()
                .filter_map(|img| img.validate(&mut errors, "images", None, false))
                .collect::<Vec<_>>()
        });

        let (Some(name), Some(description), Some(price), Some(category), Some(sale_price)) =
            (name, description, price, category, sale_price)
        else {
            return Err(AppError::Validation(errors));
        };
        errors.into_result()?;

        let slug = slug
            .filter(|s| !s.is_empty())
            .or_else(|| base.as_ref().map(|b| b.slug.clone()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| simple_slug(&name));

        let flag = |value: Option<bool>, stored: Option<bool>, default: bool| {
            value.or(stored).unwrap_or(default)
        };
        let stored = base.as_ref();
        let input = ProductInput {
            name,
            slug,
            description,
            price,
            category,
            is_active: flag(self.is_active, stored.map(|b| b.is_active), true),
            on_sale: flag(self.on_sale, stored.map(|b| b.on_sale), false),
            sale_price,
            sale_start: self
                .sale_start
                .unwrap_or_else(|| stored.and_then(|b| b.sale_start)),
            sale_end: self.sale_end.unwrap_or_else(|| stored.and_then(|b| b.sale_end)),
            is_featured: flag(self.is_featured, stored.map(|b| b.is_featured), false),
            is_new: flag(self.is_new, stored.map(|b| b.is_new), false),
            is_best_seller: flag(self.is_best_seller, stored.map(|b| b.is_best_seller), false),
            is_top_rated: flag(self.is_top_rated, stored.map(|b| b.is_top_rated), false),
        };

        Ok(ValidProduct { input, images })
    }
}

/// Map a slug conflict onto the `slug` field.
fn slug_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(msg) => AppError::field("slug", msg),
        other => AppError::Database(other),
    }
}

/// Load a product or 404.
pub(super) async fn require_product(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(AppError::not_found)
}

/// One page of list items for `filter`, resolving `?page=last`.
async fn product_page(
    state: &AppState,
    filter: &ProductFilter,
    params: &PageParams,
    url: &PageUrl,
) -> Result<Paginated<ProductListItem>> {
    let repo = ProductRepository::new(state.pool());
    let mut page = PageRequest::from_params(params)?;
    if page.is_last() {
        let (_, count) = repo.list(filter, 0, 0).await?;
        page = page.resolve(count);
    }

    let (products, count) = repo.list(filter, page.page_size, page.offset()).await?;
    let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let images = repo.images_for(&ids).await?;

    let items = products
        .iter()
        .map(|product| {
            let primary = images
                .get(&product.id)
                .and_then(|imgs| primary_image(imgs));
            ProductListItem::new(product, primary, state.media_url())
        })
        .collect();

    page.paginate(items, count, url)
}

/// List active products.
///
/// GET /api/products/
///
/// # Errors
///
/// Returns a 400 for an unknown `category`, a 404 for a bad page.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<ProductListQuery>,
) -> Result<Json<Paginated<ProductListItem>>> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<ProductCategory>().map_err(|_| {
            AppError::field(
                "category",
                format!("Select a valid choice. {raw} is not one of the available choices."),
            )
        })?),
    };

    let filter = ProductFilter {
        active_only: true,
        category,
        is_active: parse_bool(query.is_active.as_deref()),
        search: query.search,
        sort: ProductSort::parse(query.ordering.as_deref()),
    };
    let params = PageParams {
        page: query.page,
        page_size: query.page_size,
    };
    let url = PageUrl::new(&state.config().base_url, &uri);

    Ok(Json(product_page(&state, &filter, &params, &url).await?))
}

/// Active products of one category; an unknown category is an empty list.
///
/// GET /api/products/category/{category}/
///
/// # Errors
///
/// Returns a 404 for a bad page.
#[instrument(skip(state))]
pub async fn products_by_category(
    State(state): State<AppState>,
    PathParams(category): PathParams<String>,
    OriginalUri(uri): OriginalUri,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<Json<Paginated<ProductListItem>>> {
    let url = PageUrl::new(&state.config().base_url, &uri);
    let Ok(category) = category.parse::<ProductCategory>() else {
        let page = PageRequest::from_params(&params)?.resolve(0);
        return Ok(Json(page.paginate(Vec::new(), 0, &url)?));
    };

    let filter = ProductFilter {
        active_only: true,
        category: Some(category),
        ..ProductFilter::default()
    };
    Ok(Json(product_page(&state, &filter, &params, &url).await?))
}

/// Search active products by name or description.
///
/// GET /api/products/search/?q=
///
/// # Errors
///
/// Returns a 404 for a bad page.
#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<ProductSearchQuery>,
) -> Result<Json<Paginated<ProductListItem>>> {
    let filter = ProductFilter {
        active_only: true,
        search: query.q,
        ..ProductFilter::default()
    };
    let params = PageParams {
        page: query.page,
        page_size: query.page_size,
    };
    let url = PageUrl::new(&state.config().base_url, &uri);
    Ok(Json(product_page(&state, &filter, &params, &url).await?))
}

/// Catalog counters.
///
/// GET /api/products/stats/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state))]
pub async fn product_stats(State(state): State<AppState>) -> Result<Json<ProductStats>> {
    Ok(Json(ProductRepository::new(state.pool()).stats().await?))
}

/// Product detail, active or not.
///
/// GET /api/products/{id}/
///
/// # Errors
///
/// Returns a 404 when the product does not exist.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    PathParams(id): PathParams<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = require_product(&state, id).await?;
    let images = ProductRepository::new(state.pool()).images(id).await?;
    Ok(Json(ProductDetail::new(&product, &images, state.media_url())))
}

/// Create a product with optional images.
///
/// POST /api/products/
///
/// # Errors
///
/// Returns a 400 for invalid input or a duplicate slug.
#[instrument(skip(state, staff, body), fields(staff = %staff.username))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    JsonBody(body): JsonBody<ProductWriteRequest>,
) -> Result<(StatusCode, Json<ProductWriteView>)> {
    let valid = body.validate(None, false)?;
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .create(&valid.input, valid.images.as_deref().unwrap_or_default())
        .await
        .map_err(slug_conflict)?;
    let images = repo.images(product.id).await?;

    info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok((
        StatusCode::CREATED,
        Json(ProductWriteView::new(&product, &images, state.media_url())),
    ))
}

async fn write_update(
    state: &AppState,
    id: ProductId,
    body: ProductWriteRequest,
    partial: bool,
) -> Result<Json<ProductWriteView>> {
    let existing = require_product(state, id).await?;
    let valid = body.validate(Some(&existing), partial)?;
    let replace_images = valid.images.as_deref().filter(|imgs| !imgs.is_empty());

    let repo = ProductRepository::new(state.pool());
    let product = repo
        .update(id, &valid.input, replace_images)
        .await
        .map_err(slug_conflict)?;
    let images = repo.images(id).await?;

    info!(product_id = %id, partial, "Product updated");
    Ok(Json(ProductWriteView::new(
        &product,
        &images,
        state.media_url(),
    )))
}

/// Replace a product.
///
/// PUT /api/products/{id}/
///
/// # Errors
///
/// Returns a 404 for an unknown product, a 400 for invalid input.
#[instrument(skip(state, _staff, body))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    PathParams(id): PathParams<ProductId>,
    JsonBody(body): JsonBody<ProductWriteRequest>,
) -> Result<Json<ProductWriteView>> {
    write_update(&state, id, body, false).await
}

/// Partially update a product.
///
/// PATCH /api/products/{id}/
///
/// # Errors
///
/// Returns a 404 for an unknown product, a 400 for invalid input.
#[instrument(skip(state, _staff, body))]
pub async fn patch_product(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    PathParams(id): PathParams<ProductId>,
    JsonBody(body): JsonBody<ProductWriteRequest>,
) -> Result<Json<ProductWriteView>> {
    write_update(&state, id, body, true).await
}

/// Delete a product and everything that references it.
///
/// DELETE /api/products/{id}/
///
/// # Errors
///
/// Returns a 404 for an unknown product.
#[instrument(skip(state, staff), fields(staff = %staff.username))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    PathParams(id): PathParams<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::sample_product;

    fn request(json: serde_json::Value) -> ProductWriteRequest {
        serde_json::from_value(json).unwrap()
    }

    fn errors_of(result: Result<ValidProduct>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_requires_core_fields() {
        let errors = errors_of(request(serde_json::json!({})).validate(None, false));
        for field in ["name", "description", "price", "category"] {
            assert_eq!(
                errors.get(field),
                Some(&[validation::REQUIRED.to_string()][..]),
                "{field}"
            );
        }
    }

    #[test]
    fn test_create_generates_slug_and_defaults() {
        let valid = request(serde_json::json!({
            "name": "Whitening Kit",
            "description": "Home whitening",
            "price": "29.99",
            "category": "cosmetic",
            "images": [{ "image": "products/kit.jpg", "is_primary": true }]
        }))
        .validate(None, false)
        .unwrap();

        assert_eq!(valid.input.slug, "whitening-kit");
        assert!(valid.input.is_active);
        assert!(!valid.input.on_sale);
        assert_eq!(valid.input.price, "29.99".parse::<Decimal>().unwrap());
        let images = valid.images.unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].is_primary);
        assert_eq!(images[0].alt_text, "");
    }

    #[test]
    fn test_invalid_category_and_price() {
        let errors = errors_of(
            request(serde_json::json!({
                "name": "Kit",
                "description": "x",
                "price": "-1",
                "category": "teeth"
            }))
            .validate(None, false),
        );
        assert!(errors.contains("price"));
        assert_eq!(
            errors.get("category"),
            Some(&["\"teeth\" is not a valid choice.".to_string()][..])
        );
    }

    #[test]
    fn test_patch_keeps_stored_values() {
        let product = Product {
            on_sale: true,
            sale_price: Some("39.99".parse().unwrap()),
            ..sample_product()
        };
        let valid = request(serde_json::json!({ "price": "45.00" }))
            .validate(Some(&product), true)
            .unwrap();
        assert_eq!(valid.input.name, "Night Guard");
        assert_eq!(valid.input.slug, "night-guard");
        assert_eq!(valid.input.price, "45".parse::<Decimal>().unwrap());
        assert_eq!(valid.input.sale_price, product.sale_price);
        assert!(valid.input.on_sale);
        assert!(valid.images.is_none());
    }

    #[test]
    fn test_patch_null_clears_sale_price() {
        let product = Product {
            sale_price: Some("39.99".parse().unwrap()),
            ..sample_product()
        };
        let valid = request(serde_json::json!({ "sale_price": null }))
            .validate(Some(&product), true)
            .unwrap();
        assert!(valid.input.sale_price.is_none());
    }

    #[test]
    fn test_put_requires_fields_even_with_existing() {
        let product = sample_product();
        let errors =
            errors_of(request(serde_json::json!({ "name": "x" })).validate(Some(&product), false));
        assert!(errors.contains("price"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn test_blank_slug_regenerated_from_name() {
        let valid = request(serde_json::json!({
            "name": "Soft Brush",
            "slug": "  ",
            "description": "Gentle",
            "price": 4,
            "category": "preventive"
        }))
        .validate(None, false)
        .unwrap();
        assert_eq!(valid.input.slug, "soft-brush");
    }

    #[test]
    fn test_image_without_path_is_rejected() {
        let errors = errors_of(
            request(serde_json::json!({
                "name": "Kit",
                "description": "x",
                "price": "1",
                "category": "cosmetic",
                "images": [{ "alt_text": "front" }]
            }))
            .validate(None, false),
        );
        assert!(errors.contains("images"));
    }
}
