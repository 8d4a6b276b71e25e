//! Product and product image repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use dental_com_core::{ProductCategory, ProductId, ProductImageId};

use super::{RepositoryError, like_pattern};
use crate::models::product::{Product, ProductImage, ProductStats};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, category, is_active, on_sale, \
     sale_price, sale_start, sale_end, is_featured, is_new, is_best_seller, is_top_rated, \
     created_at, updated_at";

const IMAGE_COLUMNS: &str = "id, product_id, image, alt_text, is_primary, created_at";

const SLUG_CONFLICT: &str = "product with this slug already exists.";

/// Sortable product columns accepted by `?ordering=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrdering {
    Name,
    Price,
    CreatedAt,
}

/// A validated ordering: column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub field: ProductOrdering,
    pub descending: bool,
}

impl Default for ProductSort {
    fn default() -> Self {
        Self {
            field: ProductOrdering::CreatedAt,
            descending: true,
        }
    }
}

impl ProductSort {
    /// Parse `name`, `-price`, ... falling back to newest-first for unknown fields.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::default();
        };
        let (descending, field) = raw
            .strip_prefix('-')
            .map_or((false, raw), |rest| (true, rest));
        let field = match field {
            "name" => ProductOrdering::Name,
            "price" => ProductOrdering::Price,
            "created_at" => ProductOrdering::CreatedAt,
            _ => return Self::default(),
        };
        Self { field, descending }
    }

    fn sql(self) -> &'static str {
        match (self.field, self.descending) {
            (ProductOrdering::Name, false) => "name ASC, id ASC",
            (ProductOrdering::Name, true) => "name DESC, id DESC",
            (ProductOrdering::Price, false) => "price ASC, id ASC",
            (ProductOrdering::Price, true) => "price DESC, id DESC",
            (ProductOrdering::CreatedAt, false) => "created_at ASC, id ASC",
            (ProductOrdering::CreatedAt, true) => "created_at DESC, id DESC",
        }
    }
}

/// Filters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to `is_active` products regardless of `is_active` below.
    pub active_only: bool,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub sort: ProductSort,
}

/// Complete column values for inserting or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub is_active: bool,
    pub on_sale: bool,
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
    pub is_featured: bool,
    pub is_new: bool,
    pub is_best_seller: bool,
    pub is_top_rated: bool,
}

impl From<&Product> for ProductInput {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            slug: p.slug.clone(),
            description: p.description.clone(),
            price: p.price,
            category: p.category,
            is_active: p.is_active,
            on_sale: p.on_sale,
            sale_price: p.sale_price,
            sale_start: p.sale_start,
            sale_end: p.sale_end,
            is_featured: p.is_featured,
            is_new: p.is_new,
            is_best_seller: p.is_best_seller,
            is_top_rated: p.is_top_rated,
        }
    }
}

/// Image values for insert or update.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub image: String,
    pub alt_text: String,
    pub is_primary: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, returning one page and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storefront.products");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products"
        ));
        push_filters(&mut query, filter);
        query.push(" ORDER BY ");
        query.push(filter.sort.sql());
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok((products, total))
    }

    /// Get a product by ID regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get several products by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.products WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?)
    }

    /// Images of one product, primary first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM storefront.product_images
             WHERE product_id = $1
             ORDER BY is_primary DESC, created_at ASC, id ASC"
        );
        Ok(sqlx::query_as::<_, ProductImage>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?)
    }

    /// Images of several products grouped by product, each group primary first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<ProductImage>>, RepositoryError> {
        let raw: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM storefront.product_images
             WHERE product_id = ANY($1)
             ORDER BY product_id, is_primary DESC, created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, ProductImage>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;

        let mut grouped: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        for image in rows {
            grouped.entry(image.product_id).or_default().push(image);
        }
        Ok(grouped)
    }

    /// Insert a product and its images in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &ProductInput,
        images: &[ImageInput],
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO storefront.products
                 (name, slug, description, price, category, is_active, on_sale, sale_price,
                  sale_start, sale_end, is_featured, is_new, is_best_seller, is_top_rated)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {PRODUCT_COLUMNS}"
        );
        let product = bind_input(sqlx::query_as::<_, Product>(&sql), input)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, SLUG_CONFLICT))?;

        for image in images {
            insert_image(&mut tx, product.id, image).await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Insert or update a product keyed by slug. Images are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.products
                 (name, slug, description, price, category, is_active, on_sale, sale_price,
                  sale_start, sale_end, is_featured, is_new, is_best_seller, is_top_rated)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (slug) DO UPDATE
                 SET name = EXCLUDED.name, description = EXCLUDED.description,
                     price = EXCLUDED.price, category = EXCLUDED.category,
                     is_active = EXCLUDED.is_active, on_sale = EXCLUDED.on_sale,
                     sale_price = EXCLUDED.sale_price, sale_start = EXCLUDED.sale_start,
                     sale_end = EXCLUDED.sale_end, is_featured = EXCLUDED.is_featured,
                     is_new = EXCLUDED.is_new, is_best_seller = EXCLUDED.is_best_seller,
                     is_top_rated = EXCLUDED.is_top_rated, updated_at = NOW()
             RETURNING {PRODUCT_COLUMNS}"
        );
        Ok(bind_input(sqlx::query_as::<_, Product>(&sql), input)
            .fetch_one(self.pool)
            .await?)
    }

    /// Replace a product's columns; when `images` is given, replace its images too.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        images: Option<&[ImageInput]>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE storefront.products
             SET name = $1, slug = $2, description = $3, price = $4, category = $5,
                 is_active = $6, on_sale = $7, sale_price = $8, sale_start = $9, sale_end = $10,
                 is_featured = $11, is_new = $12, is_best_seller = $13, is_top_rated = $14,
                 updated_at = NOW()
             WHERE id = $15
             RETURNING {PRODUCT_COLUMNS}"
        );
        let product = bind_input(sqlx::query_as::<_, Product>(&sql), input)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, SLUG_CONFLICT))?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(images) = images {
            sqlx::query("DELETE FROM storefront.product_images WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for image in images {
                insert_image(&mut tx, id, image).await?;
            }
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Hard-delete a product; images, cart lines and reviews cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Catalog counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let (total, active): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM storefront.products",
        )
        .fetch_one(self.pool)
        .await?;

        let categories: Vec<ProductCategory> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM storefront.products ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ProductStats {
            total_products: total,
            active_products: active,
            inactive_products: total - active,
            categories_count: categories.len(),
            categories,
        })
    }

    /// Get one image, scoped to its product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_image(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<Option<ProductImage>, RepositoryError> {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM storefront.product_images
             WHERE id = $1 AND product_id = $2"
        );
        Ok(sqlx::query_as::<_, ProductImage>(&sql)
            .bind(image_id)
            .bind(product_id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Add an image to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_image(
        &self,
        product_id: ProductId,
        image: &ImageInput,
    ) -> Result<ProductImage, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let created = insert_image(&mut tx, product_id, image).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Replace an image's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to the product.
    pub async fn update_image(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
        image: &ImageInput,
    ) -> Result<ProductImage, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if image.is_primary {
            clear_primary(&mut tx, product_id, Some(image_id)).await?;
        }

        let sql = format!(
            "UPDATE storefront.product_images
             SET image = $3, alt_text = $4, is_primary = $5
             WHERE id = $1 AND product_id = $2
             RETURNING {IMAGE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ProductImage>(&sql)
            .bind(image_id)
            .bind(product_id)
            .bind(&image.image)
            .bind(&image.alt_text)
            .bind(image.is_primary)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete an image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to the product.
    pub async fn delete_image(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.product_images WHERE id = $1 AND product_id = $2")
                .bind(image_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(" WHERE TRUE");
    if filter.active_only {
        query.push(" AND is_active");
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ");
        query.push_bind(category);
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

fn bind_input<'q>(
    query: sqlx::query::QueryAs<'q, Postgres, Product, sqlx::postgres::PgArguments>,
    input: &'q ProductInput,
) -> sqlx::query::QueryAs<'q, Postgres, Product, sqlx::postgres::PgArguments> {
    query
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category)
        .bind(input.is_active)
        .bind(input.on_sale)
        .bind(input.sale_price)
        .bind(input.sale_start)
        .bind(input.sale_end)
        .bind(input.is_featured)
        .bind(input.is_new)
        .bind(input.is_best_seller)
        .bind(input.is_top_rated)
}

/// Clear `is_primary` on a product's images, optionally sparing one.
async fn clear_primary(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    except: Option<ProductImageId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE storefront.product_images SET is_primary = FALSE
         WHERE product_id = $1 AND is_primary AND ($2::INTEGER IS NULL OR id <> $2)",
    )
    .bind(product_id)
    .bind(except)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Insert an image; a primary image demotes the product's other images.
async fn insert_image(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    image: &ImageInput,
) -> Result<ProductImage, RepositoryError> {
    if image.is_primary {
        clear_primary(tx, product_id, None).await?;
    }

    let sql = format!(
        "INSERT INTO storefront.product_images (product_id, image, alt_text, is_primary)
         VALUES ($1, $2, $3, $4)
         RETURNING {IMAGE_COLUMNS}"
    );
    Ok(sqlx::query_as::<_, ProductImage>(&sql)
        .bind(product_id)
        .bind(&image.image)
        .bind(&image.alt_text)
        .bind(image.is_primary)
        .fetch_one(&mut **tx)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse_known_fields() {
        assert_eq!(
            ProductSort::parse(Some("-price")),
            ProductSort {
                field: ProductOrdering::Price,
                descending: true
            }
        );
        assert_eq!(
            ProductSort::parse(Some("name")),
            ProductSort {
                field: ProductOrdering::Name,
                descending: false
            }
        );
    }

    #[test]
    fn test_sort_parse_falls_back_to_newest() {
        assert_eq!(ProductSort::parse(None), ProductSort::default());
        assert_eq!(ProductSort::parse(Some("id; DROP TABLE")), ProductSort::default());
        assert_eq!(ProductSort::parse(Some("")), ProductSort::default());
        assert_eq!(ProductSort::default().sql(), "created_at DESC, id DESC");
    }
}
