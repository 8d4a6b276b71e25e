//! Cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use dental_com_core::{CartId, CartItemId, ProductCategory, ProductId, ProductImageId, UserId};

use super::product::{Product, ProductImage};
use super::media_url;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line together with its product and images.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
    pub images: Vec<ProductImage>,
}

impl CartLine {
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.product.current_price() * Decimal::from(self.item.quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartProductImageView {
    pub id: ProductImageId,
    pub image: String,
    pub alt_text: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartProductView {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub on_sale: bool,
    pub current_price: Decimal,
    pub images: Vec<CartProductImageView>,
    pub category: ProductCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product: CartProductView,
    pub quantity: i32,
    pub total_price: Decimal,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItemView {
    #[must_use]
    pub fn new(line: &CartLine, media_prefix: &str) -> Self {
        let product = &line.product;
        Self {
            id: line.item.id,
            product: CartProductView {
                id: product.id,
                name: product.name.clone(),
                slug: product.slug.clone(),
                price: product.price,
                sale_price: product.sale_price,
                on_sale: product.on_sale,
                current_price: product.current_price(),
                images: line
                    .images
                    .iter()
                    .map(|img| CartProductImageView {
                        id: img.id,
                        image: media_url(media_prefix, &img.image),
                        alt_text: img.alt_text.clone(),
                        is_primary: img.is_primary,
                    })
                    .collect(),
                category: product.category,
            },
            quantity: line.item.quantity,
            total_price: line.total_price(),
            added_at: line.item.added_at,
            updated_at: line.item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub user: UserId,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
    pub total_items: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, lines: &[CartLine], media_prefix: &str) -> Self {
        let items: Vec<CartItemView> = lines
            .iter()
            .map(|line| CartItemView::new(line, media_prefix))
            .collect();
        let total_price = items.iter().map(|item| item.total_price).sum();
        let total_items = lines.iter().map(|line| i64::from(line.item.quantity)).sum();

        Self {
            id: cart.id,
            user: cart.user_id,
            items,
            total_price,
            total_items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::sample_product;

    fn line(id: i32, price: &str, quantity: i32) -> CartLine {
        let now = Utc::now();
        CartLine {
            item: CartItem {
                id: CartItemId::new(id),
                cart_id: CartId::new(1),
                product_id: ProductId::new(id),
                quantity,
                added_at: now,
                updated_at: now,
            },
            product: Product {
                id: ProductId::new(id),
                price: price.parse().unwrap(),
                ..sample_product()
            },
            images: Vec::new(),
        }
    }

    #[test]
    fn test_cart_totals() {
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(1),
            user_id: UserId::generate(),
            created_at: now,
            updated_at: now,
        };
        let lines = vec![line(1, "10.50", 2), line(2, "4.00", 3)];
        let view = CartView::new(&cart, &lines, "/media/");

        assert_eq!(view.total_items, 5);
        assert_eq!(view.total_price, "33.00".parse::<Decimal>().unwrap());
        assert_eq!(view.items.len(), 2);
    }

    #[test]
    fn test_line_total_uses_sale_price() {
        let mut sale = line(1, "20.00", 2);
        sale.product.on_sale = true;
        sale.product.sale_price = Some("15.00".parse().unwrap());
        assert_eq!(sale.total_price(), "30.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_empty_cart() {
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(7),
            user_id: UserId::generate(),
            created_at: now,
            updated_at: now,
        };
        let view = CartView::new(&cart, &[], "/media/");
        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_price, Decimal::ZERO);
    }
}
