//! Review repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use dental_com_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::review::{RatingCount, Review};

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, r.rating, r.title, r.comment, \
     r.is_archived, r.is_verified_purchase, r.is_helpful, r.created_at, r.updated_at, \
     u.username, u.first_name, u.last_name, u.email \
     FROM storefront.reviews r JOIN storefront.users u ON u.id = r.user_id";

pub const DUPLICATE_REVIEW: &str = "You have already reviewed this product.";

/// Validated review content.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub is_verified_purchase: bool,
}

/// Filters for listing reviews.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewFilter {
    pub product_id: Option<ProductId>,
    pub user_id: Option<UserId>,
    pub rating: Option<i32>,
    pub verified_only: bool,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active (non-archived) reviews matching `filter`, newest first.
    ///
    /// `limit` of `None` returns every match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: ReviewFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM storefront.reviews r",
        );
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(REVIEW_SELECT);
        push_filters(&mut query, filter);
        query.push(" ORDER BY r.created_at DESC, r.id DESC");
        if let Some(limit) = limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        query.push(" OFFSET ");
        query.push_bind(offset);

        let reviews = query
            .build_query_as::<Review>()
            .fetch_all(self.pool)
            .await?;
        Ok((reviews, total))
    }

    /// Count of active reviews per rating for one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn distribution(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<RatingCount>, RepositoryError> {
        Ok(sqlx::query_as::<_, RatingCount>(
            "SELECT rating, COUNT(*) AS count FROM storefront.reviews
             WHERE product_id = $1 AND NOT is_archived
             GROUP BY rating
             ORDER BY rating",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Number of active verified-purchase reviews for one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn verified_count(&self, product_id: ProductId) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM storefront.reviews
             WHERE product_id = $1 AND NOT is_archived AND is_verified_purchase",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?)
    }

    /// Get an active review of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1 AND r.product_id = $2 AND NOT r.is_archived");
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(review_id)
            .bind(product_id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get a user's review of a product, archived or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_author(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("{REVIEW_SELECT} WHERE r.product_id = $1 AND r.user_id = $2");
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(product_id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        input: &ReviewInput,
    ) -> Result<ReviewId, RepositoryError> {
        sqlx::query_scalar(
            "INSERT INTO storefront.reviews
                 (product_id, user_id, rating, title, comment, is_verified_purchase)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(input.rating)
        .bind(&input.title)
        .bind(&input.comment)
        .bind(input.is_verified_purchase)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, DUPLICATE_REVIEW))
    }

    /// Overwrite a review's content; `restore` also un-archives it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn update(
        &self,
        review_id: ReviewId,
        input: &ReviewInput,
        restore: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.reviews
             SET rating = $2, title = $3, comment = $4, is_verified_purchase = $5,
                 is_archived = CASE WHEN $6 THEN FALSE ELSE is_archived END,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(review_id)
        .bind(input.rating)
        .bind(&input.title)
        .bind(&input.comment)
        .bind(input.is_verified_purchase)
        .bind(restore)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn archive(&self, review_id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.reviews SET is_archived = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(review_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add a helpful vote to an active review, returning the new count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active review matches.
    pub async fn mark_helpful(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<i32, RepositoryError> {
        sqlx::query_scalar(
            "UPDATE storefront.reviews SET is_helpful = is_helpful + 1
             WHERE id = $1 AND product_id = $2 AND NOT is_archived
             RETURNING is_helpful",
        )
        .bind(review_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: ReviewFilter) {
    query.push(" WHERE NOT r.is_archived");
    if let Some(product_id) = filter.product_id {
        query.push(" AND r.product_id = ");
        query.push_bind(product_id);
    }
    if let Some(user_id) = filter.user_id {
        query.push(" AND r.user_id = ");
        query.push_bind(user_id);
    }
    if let Some(rating) = filter.rating {
        query.push(" AND r.rating = ");
        query.push_bind(rating);
    }
    if filter.verified_only {
        query.push(" AND r.is_verified_purchase");
    }
}
