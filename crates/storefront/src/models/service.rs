//! Clinic service types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dental_com_core::{ServiceId, ServiceImageId};

use super::media_url;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceImage {
    pub id: ServiceImageId,
    pub service_id: ServiceId,
    pub image: String,
    pub alt_text: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceImageView {
    pub id: ServiceImageId,
    pub image: String,
    pub alt_text: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    pub id: ServiceId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<ServiceImageView>,
}

impl ServiceView {
    /// `images` must belong to `service` and be ordered by `(order, created_at)`.
    #[must_use]
    pub fn new(service: &Service, images: &[ServiceImage], media_prefix: &str) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
            slug: service.slug.clone(),
            description: service.description.clone(),
            meta_description: service.meta_description.clone(),
            meta_keywords: service.meta_keywords.clone(),
            is_active: service.is_active,
            is_featured: service.is_featured,
            is_new: service.is_new,
            created_at: service.created_at,
            updated_at: service.updated_at,
            images: images
                .iter()
                .map(|img| ServiceImageView {
                    id: img.id,
                    image: media_url(media_prefix, &img.image),
                    alt_text: img.alt_text.clone(),
                    order: img.order,
                    created_at: img.created_at,
                })
                .collect(),
        }
    }
}
