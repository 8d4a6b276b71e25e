//! Shopping cart API. Every handler acts on the caller's own cart.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use dental_com_core::{CartItemId, ProductId};

use super::validation::REQUIRED;
use super::{JsonBody, PathParams};
use crate::db::carts::Decrement;
use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, FieldErrors, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::cart::{Cart, CartView};
use crate::models::user::User;
use crate::state::AppState;

const MIN_QUANTITY: &str = "Ensure this value is greater than or equal to 1.";

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<i32>,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<i32>,
}

/// `{message, cart}` body returned by every cart mutation.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub message: &'static str,
    pub cart: CartView,
}

#[derive(Debug, Serialize)]
pub struct ItemCount {
    pub total_quantity: i64,
}

async fn cart_of(state: &AppState, user: &User) -> Result<Cart> {
    Ok(CartRepository::new(state.pool())
        .get_or_create(user.id)
        .await?)
}

async fn render(state: &AppState, cart: &Cart) -> Result<CartView> {
    let lines = CartRepository::new(state.pool()).lines(cart.id).await?;
    Ok(CartView::new(cart, &lines, state.media_url()))
}

async fn respond(state: &AppState, cart: &Cart, message: &'static str) -> Result<Json<CartResponse>> {
    Ok(Json(CartResponse {
        message,
        cart: render(state, cart).await?,
    }))
}

/// Check a requested quantity is at least one.
fn check_quantity(errors: &mut FieldErrors, quantity: Option<i32>) -> Option<i32> {
    match quantity {
        None => {
            errors.add("quantity", REQUIRED);
            None
        }
        Some(q) if q < 1 => {
            errors.add("quantity", MIN_QUANTITY);
            None
        }
        Some(q) => Some(q),
    }
}

/// GET /api/cart/
///
/// # Errors
///
/// Returns `AppError::Database` if the cart cannot be loaded.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartView>> {
    let cart = cart_of(&state, &user).await?;
    Ok(Json(render(&state, &cart).await?))
}

/// Add a product, merging with an existing line.
///
/// POST /api/cart/add/
///
/// # Errors
///
/// Returns a 400 for an unknown or inactive product or a quantity below one.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartResponse>)> {
    let mut errors = FieldErrors::new();
    let quantity = check_quantity(&mut errors, Some(body.quantity));

    let product = match body.product_id {
        None => {
            errors.add("product_id", REQUIRED);
            None
        }
        Some(id) => match ProductRepository::new(state.pool())
            .get(ProductId::new(id))
            .await?
        {
            None => {
                errors.add("product_id", "Product not found.");
                None
            }
            Some(product) if !product.is_active => {
                errors.add("product_id", "This product is not available.");
                None
            }
            Some(product) => Some(product),
        },
    };

    let (Some(product), Some(quantity)) = (product, quantity) else {
        return Err(AppError::Validation(errors));
    };

    let cart = cart_of(&state, &user).await?;
    let added = CartRepository::new(state.pool())
        .add_item(cart.id, product.id, quantity)
        .await?;

    info!(
        product_id = %product.id,
        quantity = added.item.quantity,
        created = added.created,
        "Item added to cart"
    );
    add_breadcrumb(
        "cart",
        "Add to cart",
        &[("product_id", &product.id.to_string())],
    );

    let status = if added.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        respond(&state, &cart, "Item added to cart successfully").await?,
    ))
}

/// POST /api/cart/increase/{cart_item_id}/
///
/// # Errors
///
/// Returns a 404 when the line is not in the caller's cart.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %item_id))]
pub async fn increase_quantity(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    PathParams(item_id): PathParams<CartItemId>,
) -> Result<Json<CartResponse>> {
    let cart = cart_of(&state, &user).await?;
    CartRepository::new(state.pool())
        .increment(cart.id, item_id)
        .await?;
    respond(&state, &cart, "Item quantity increased").await
}

/// Decrease by one, removing the line at zero.
///
/// POST /api/cart/decrease/{cart_item_id}/
///
/// # Errors
///
/// Returns a 404 when the line is not in the caller's cart.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %item_id))]
pub async fn decrease_quantity(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    PathParams(item_id): PathParams<CartItemId>,
) -> Result<Json<CartResponse>> {
    let cart = cart_of(&state, &user).await?;
    let message = match CartRepository::new(state.pool())
        .decrement(cart.id, item_id)
        .await?
    {
        Decrement::Decreased(_) => "Item quantity decreased",
        Decrement::Removed => "Item removed from cart",
    };
    respond(&state, &cart, message).await
}

/// PUT /api/cart/update/{cart_item_id}/
///
/// # Errors
///
/// Returns a 404 for a foreign line, a 400 for a quantity below one.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %item_id))]
pub async fn update_quantity(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    PathParams(item_id): PathParams<CartItemId>,
    JsonBody(body): JsonBody<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>> {
    let cart = cart_of(&state, &user).await?;
    let mut errors = FieldErrors::new();
    let Some(quantity) = check_quantity(&mut errors, body.quantity) else {
        return Err(AppError::Validation(errors));
    };
    CartRepository::new(state.pool())
        .set_quantity(cart.id, item_id, quantity)
        .await?;
    respond(&state, &cart, "Item quantity updated").await
}

/// DELETE /api/cart/remove/{cart_item_id}/
///
/// # Errors
///
/// Returns a 404 when the line is not in the caller's cart.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %item_id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    PathParams(item_id): PathParams<CartItemId>,
) -> Result<Json<CartResponse>> {
    let cart = cart_of(&state, &user).await?;
    CartRepository::new(state.pool())
        .remove_item(cart.id, item_id)
        .await?;
    respond(&state, &cart, "Item removed from cart").await
}

/// POST /api/cart/clear/
///
/// # Errors
///
/// Returns `AppError::Database` if the delete fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartResponse>> {
    let cart = cart_of(&state, &user).await?;
    let removed = CartRepository::new(state.pool()).clear(cart.id).await?;
    info!(cart_id = %cart.id, removed, "Cart cleared");
    respond(&state, &cart, "Cart cleared successfully").await
}

/// GET /api/cart/item-count/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn item_count(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ItemCount>> {
    let cart = cart_of(&state, &user).await?;
    let total_quantity = CartRepository::new(state.pool())
        .total_quantity(cart.id)
        .await?;
    Ok(Json(ItemCount { total_quantity }))
}
