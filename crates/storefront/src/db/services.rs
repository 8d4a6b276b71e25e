//! Service repository.

use std::collections::HashMap;

use sqlx::PgPool;

use dental_com_core::ServiceId;

use super::RepositoryError;
use crate::models::service::{Service, ServiceImage};

const SERVICE_COLUMNS: &str = "id, name, slug, description, meta_description, meta_keywords, \
     is_active, is_featured, is_new, created_at, updated_at";

/// Fields needed to upsert a service from seed data.
#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_new: bool,
}

/// Repository for service database operations.
pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active services, newest first, plus the total active count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_active(
        &self,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<Service>, i64), RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.services WHERE is_active")
                .fetch_one(self.pool)
                .await?;

        let sql = format!(
            "SELECT {SERVICE_COLUMNS} FROM storefront.services
             WHERE is_active
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        let services = sqlx::query_as::<_, Service>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;
        Ok((services, total))
    }

    /// Images of several services grouped by service, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images_for(
        &self,
        service_ids: &[ServiceId],
    ) -> Result<HashMap<ServiceId, Vec<ServiceImage>>, RepositoryError> {
        let raw: Vec<i32> = service_ids.iter().map(ServiceId::as_i32).collect();
        let images = sqlx::query_as::<_, ServiceImage>(
            r#"SELECT id, service_id, image, alt_text, "order", created_at
               FROM storefront.service_images
               WHERE service_id = ANY($1)
               ORDER BY "order" ASC, created_at ASC, id ASC"#,
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<ServiceId, Vec<ServiceImage>> = HashMap::new();
        for image in images {
            grouped.entry(image.service_id).or_default().push(image);
        }
        Ok(grouped)
    }

    /// Insert or update a service keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, input: &ServiceInput) -> Result<Service, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.services
                 (name, slug, description, meta_description, meta_keywords,
                  is_active, is_featured, is_new)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (slug) DO UPDATE
                 SET name = EXCLUDED.name,
                     description = EXCLUDED.description,
                     meta_description = EXCLUDED.meta_description,
                     meta_keywords = EXCLUDED.meta_keywords,
                     is_active = EXCLUDED.is_active,
                     is_featured = EXCLUDED.is_featured,
                     is_new = EXCLUDED.is_new,
                     updated_at = NOW()
             RETURNING {SERVICE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Service>(&sql)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.meta_description.as_deref())
            .bind(input.meta_keywords.as_deref())
            .bind(input.is_active)
            .bind(input.is_featured)
            .bind(input.is_new)
            .fetch_one(self.pool)
            .await?)
    }

    /// Replace a service's images with `images` in the given order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn replace_images(
        &self,
        service_id: ServiceId,
        images: &[(String, Option<String>)],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM storefront.service_images WHERE service_id = $1")
            .bind(service_id)
            .execute(&mut *tx)
            .await?;
        for (order, (image, alt_text)) in (0_i32..).zip(images) {
            sqlx::query(
                r#"INSERT INTO storefront.service_images (service_id, image, alt_text, "order")
                   VALUES ($1, $2, $3, $4)"#,
            )
            .bind(service_id)
            .bind(image)
            .bind(alt_text.as_deref())
            .bind(order)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
