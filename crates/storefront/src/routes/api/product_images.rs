//! Images of one product.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use dental_com_core::{ProductId, ProductImageId};

use super::products::{ImageRequest, require_product};
use super::{JsonBody, PathParams};
use crate::db::ProductRepository;
use crate::db::products::ImageInput;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::RequireStaff;
use crate::models::product::{ProductImage, ProductImageView};
use crate::state::AppState;

async fn require_image(
    state: &AppState,
    product_id: ProductId,
    image_id: ProductImageId,
) -> Result<ProductImage> {
    ProductRepository::new(state.pool())
        .get_image(product_id, image_id)
        .await?
        .ok_or_else(AppError::not_found)
}

fn validate(
    body: ImageRequest,
    existing: Option<&ProductImage>,
    partial: bool,
) -> Result<ImageInput> {
    let mut errors = FieldErrors::new();
    let input = body.validate(&mut errors, "image", existing, partial);
    match input {
        Some(input) if errors.is_empty() => Ok(input),
        _ => Err(AppError::Validation(errors)),
    }
}

/// GET /api/products/{product_id}/images/
///
/// # Errors
///
/// Returns a 404 when the product does not exist.
#[instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
    PathParams(product_id): PathParams<ProductId>,
) -> Result<Json<Vec<ProductImageView>>> {
    require_product(&state, product_id).await?;
    let images = ProductRepository::new(state.pool())
        .images(product_id)
        .await?;
    Ok(Json(
        images
            .iter()
            .map(|img| ProductImageView::new(img, state.media_url()))
            .collect(),
    ))
}

/// POST /api/products/{product_id}/images/
///
/// # Errors
///
/// Returns a 404 for an unknown product, a 400 for invalid input.
#[instrument(skip(state, _staff, body))]
pub async fn create_image(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    PathParams(product_id): PathParams<ProductId>,
    JsonBody(body): JsonBody<ImageRequest>,
) -> Result<(StatusCode, Json<ProductImageView>)> {
    require_product(&state, product_id).await?;
    let input = validate(body, None, false)?;
    let image = ProductRepository::new(state.pool())
        .add_image(product_id, &input)
        .await?;
    info!(product_id = %product_id, image_id = %image.id, "Product image added");
    Ok((
        StatusCode::CREATED,
        Json(ProductImageView::new(&image, state.media_url())),
    ))
}

/// GET /api/products/{product_id}/images/{id}/
///
/// # Errors
///
/// Returns a 404 when the image is not one of the product's.
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    PathParams((product_id, image_id)): PathParams<(ProductId, ProductImageId)>,
) -> Result<Json<ProductImageView>> {
    let image = require_image(&state, product_id, image_id).await?;
    Ok(Json(ProductImageView::new(&image, state.media_url())))
}

async fn write_image(
    state: &AppState,
    product_id: ProductId,
    image_id: ProductImageId,
    body: ImageRequest,
    partial: bool,
) -> Result<Json<ProductImageView>> {
    let existing = require_image(state, product_id, image_id).await?;
    let input = validate(body, Some(&existing), partial)?;
    let image = ProductRepository::new(state.pool())
        .update_image(product_id, image_id, &input)
        .await?;
    Ok(Json(ProductImageView::new(&image, state.media_url())))
}

/// PUT /api/products/{product_id}/images/{id}/
///
/// # Errors
///
/// Returns a 404 for an unknown image, a 400 for invalid input.
#[instrument(skip(state, _staff, body))]
pub async fn update_image(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    PathParams((product_id, image_id)): PathParams<(ProductId, ProductImageId)>,
    JsonBody(body): JsonBody<ImageRequest>,
) -> Result<Json<ProductImageView>> {
    write_image(&state, product_id, image_id, body, false).await
}

/// PATCH /api/products/{product_id}/images/{id}/
///
/// # Errors
///
/// Returns a 404 for an unknown image, a 400 for invalid input.
#[instrument(skip(state, _staff, body))]
pub async fn patch_image(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    PathParams((product_id, image_id)): PathParams<(ProductId, ProductImageId)>,
    JsonBody(body): JsonBody<ImageRequest>,
) -> Result<Json<ProductImageView>> {
    write_image(&state, product_id, image_id, body, true).await
}

/// DELETE /api/products/{product_id}/images/{id}/
///
/// # Errors
///
/// Returns a 404 when the image is not one of the product's.
#[instrument(skip(state, _staff))]
pub async fn delete_image(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    PathParams((product_id, image_id)): PathParams<(ProductId, ProductImageId)>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete_image(product_id, image_id)
        .await?;
    info!(product_id = %product_id, image_id = %image_id, "Product image deleted");
    Ok(StatusCode::NO_CONTENT)
}
