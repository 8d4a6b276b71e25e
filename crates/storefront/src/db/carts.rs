//! Cart repository.

use sqlx::PgPool;

use dental_com_core::{CartId, CartItemId, ProductId, UserId};

use super::{ProductRepository, RepositoryError};
use crate::models::cart::{Cart, CartItem, CartLine};

const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, added_at, updated_at";

/// Result of adding a product to a cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddedItem {
    #[sqlx(flatten)]
    pub item: CartItem,
    /// `true` when a new line was inserted, `false` when quantities merged.
    pub created: bool,
}

/// Result of decrementing a cart line.
#[derive(Debug, Clone)]
pub enum Decrement {
    Decreased(CartItem),
    Removed,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        Ok(sqlx::query_as::<_, Cart>(
            "INSERT INTO storefront.carts (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING id, user_id, created_at, updated_at",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?)
    }

    /// Cart lines with their products and images, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a line references a missing product.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.cart_items
             WHERE cart_id = $1
             ORDER BY added_at ASC, id ASC"
        );
        let items = sqlx::query_as::<_, CartItem>(&sql)
            .bind(cart_id)
            .fetch_all(self.pool)
            .await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let products = ProductRepository::new(self.pool);
        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let mut by_id: std::collections::HashMap<ProductId, _> = products
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let mut images = products.images_for(&ids).await?;

        items
            .into_iter()
            .map(|item| {
                let product = by_id.remove(&item.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart item {} references missing product {}",
                        item.id, item.product_id
                    ))
                })?;
                Ok(CartLine {
                    images: images.remove(&item.product_id).unwrap_or_default(),
                    product,
                    item,
                })
            })
            .collect()
    }

    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<AddedItem, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id) DO UPDATE
                 SET quantity = storefront.cart_items.quantity + EXCLUDED.quantity,
                     updated_at = NOW()
             RETURNING {ITEM_COLUMNS}, (xmax = 0) AS created"
        );
        Ok(sqlx::query_as::<_, AddedItem>(&sql)
            .bind(cart_id)
            .bind(product_id)
            .bind(quantity)
            .fetch_one(self.pool)
            .await?)
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.cart_items SET quantity = $3, updated_at = NOW()
             WHERE id = $1 AND cart_id = $2
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&sql)
            .bind(item_id)
            .bind(cart_id)
            .bind(quantity)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Add one to a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn increment(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<CartItem, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.cart_items SET quantity = quantity + 1, updated_at = NOW()
             WHERE id = $1 AND cart_id = $2
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&sql)
            .bind(item_id)
            .bind(cart_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Subtract one from a line, deleting it when it would reach zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn decrement(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Decrement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let quantity: i32 = sqlx::query_scalar(
            "SELECT quantity FROM storefront.cart_items
             WHERE id = $1 AND cart_id = $2
             FOR UPDATE",
        )
        .bind(item_id)
        .bind(cart_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let outcome = if quantity > 1 {
            let sql = format!(
                "UPDATE storefront.cart_items SET quantity = quantity - 1, updated_at = NOW()
                 WHERE id = $1
                 RETURNING {ITEM_COLUMNS}"
            );
            let item = sqlx::query_as::<_, CartItem>(&sql)
                .bind(item_id)
                .fetch_one(&mut *tx)
                .await?;
            Decrement::Decreased(item)
        } else {
            sqlx::query("DELETE FROM storefront.cart_items WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
            Decrement::Removed
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Delete one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every line, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sum of quantities across the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_quantity(&self, cart_id: CartId) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM storefront.cart_items WHERE cart_id = $1",
        )
        .bind(cart_id)
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }
}
