//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use dental_com_core::{ProductCategory, ProductId, ProductImageId, SalePricing};

use super::media_url;

/// A catalog product row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn pricing(&self) -> SalePricing {
        SalePricing {
            price: self.price,
            on_sale: self.on_sale,
            sale_price: self.sale_price,
        }
    }

    /// Price charged today, honoring an active sale.
    #[must_use]
    pub fn current_price(&self) -> Decimal {
        self.pricing().current_price()
    }
}

/// A product image row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub image: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Pick the primary image, falling back to the first one.
///
/// `images` must already be in display order (primary first).
#[must_use]
pub fn primary_image(images: &[ProductImage]) -> Option<&ProductImage> {
    images
        .iter()
        .find(|img| img.is_primary)
        .or_else(|| images.first())
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductImageView {
    pub id: ProductImageId,
    pub image: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl ProductImageView {
    #[must_use]
    pub fn new(image: &ProductImage, media_prefix: &str) -> Self {
        Self {
            id: image.id,
            image: media_url(media_prefix, &image.image),
            alt_text: image.alt_text.clone(),
            is_primary: image.is_primary,
            created_at: image.created_at,
        }
    }
}

/// Thumbnail reference used in product lists.
#[derive(Debug, Clone, Serialize)]
pub struct PrimaryImageView {
    pub id: ProductImageId,
    pub image: String,
    pub alt_text: String,
}

impl PrimaryImageView {
    #[must_use]
    pub fn new(image: &ProductImage, media_prefix: &str) -> Self {
        Self {
            id: image.id,
            image: media_url(media_prefix, &image.image),
            alt_text: image.alt_text.clone(),
        }
    }
}

/// Lightweight list representation.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListItem {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub primary_image: Option<PrimaryImageView>,
}

impl ProductListItem {
    #[must_use]
    pub fn new(product: &Product, primary: Option<&ProductImage>, media_prefix: &str) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            category: product.category,
            is_active: product.is_active,
            created_at: product.created_at,
            primary_image: primary.map(|img| PrimaryImageView::new(img, media_prefix)),
        }
    }
}

/// Full product representation.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub current_price: Decimal,
    pub on_sale: bool,
    pub sale_price: Option<Decimal>,
    pub sale_percentage: Decimal,
    pub category: ProductCategory,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_new: bool,
    pub is_best_seller: bool,
    pub is_top_rated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<ProductImageView>,
    pub primary_image: Option<ProductImageView>,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: &Product, images: &[ProductImage], media_prefix: &str) -> Self {
        let pricing = product.pricing();
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            current_price: pricing.current_price(),
            on_sale: product.on_sale,
            sale_price: product.sale_price,
            sale_percentage: pricing.sale_percentage(),
            category: product.category,
            is_active: product.is_active,
            is_featured: product.is_featured,
            is_new: product.is_new,
            is_best_seller: product.is_best_seller,
            is_top_rated: product.is_top_rated,
            created_at: product.created_at,
            updated_at: product.updated_at,
            images: images
                .iter()
                .map(|img| ProductImageView::new(img, media_prefix))
                .collect(),
            primary_image: primary_image(images).map(|img| ProductImageView::new(img, media_prefix)),
        }
    }
}

/// Representation returned after a create or update.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWriteView {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub is_active: bool,
    pub images: Vec<ProductImageView>,
}

impl ProductWriteView {
    #[must_use]
    pub fn new(product: &Product, images: &[ProductImage], media_prefix: &str) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category,
            is_active: product.is_active,
            images: images
                .iter()
                .map(|img| ProductImageView::new(img, media_prefix))
                .collect(),
        }
    }
}

/// `{id, name, slug}` reference used by review listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
        }
    }
}

/// Catalog counters for `GET /api/products/stats/`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    pub total_products: i64,
    pub active_products: i64,
    pub inactive_products: i64,
    pub categories: Vec<ProductCategory>,
    pub categories_count: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            name: "Night Guard".to_string(),
            slug: "night-guard".to_string(),
            description: "Custom fit night guard".to_string(),
            price: "49.99".parse().unwrap(),
            category: ProductCategory::Orthodontics,
            is_active: true,
            on_sale: false,
            sale_price: None,
            sale_start: None,
            sale_end: None,
            is_featured: false,
            is_new: false,
            is_best_seller: false,
            is_top_rated: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn image(id: i32, is_primary: bool) -> ProductImage {
        ProductImage {
            id: ProductImageId::new(id),
            product_id: ProductId::new(1),
            image: format!("products/{id}.jpg"),
            alt_text: String::new(),
            is_primary,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_primary_image_prefers_flagged_image() {
        let images = vec![image(1, false), image(2, true)];
        assert_eq!(primary_image(&images).unwrap().id, ProductImageId::new(2));
    }

    #[test]
    fn test_primary_image_falls_back_to_first() {
        let images = vec![image(3, false), image(4, false)];
        assert_eq!(primary_image(&images).unwrap().id, ProductImageId::new(3));
        assert!(primary_image(&[]).is_none());
    }

    #[test]
    fn test_detail_includes_sale_pricing() {
        let product = Product {
            on_sale: true,
            price: "100.00".parse().unwrap(),
            sale_price: Some("80.00".parse().unwrap()),
            ..sample_product()
        };
        let detail = ProductDetail::new(&product, &[image(1, true)], "/media/");
        assert_eq!(detail.current_price, "80.00".parse::<Decimal>().unwrap());
        assert_eq!(detail.sale_percentage, "20".parse::<Decimal>().unwrap());
        assert_eq!(detail.images[0].image, "/media/products/1.jpg");
        assert!(detail.primary_image.is_some());
    }

    #[test]
    fn test_list_item_serializes_price_as_string() {
        let product = sample_product();
        let value = serde_json::to_value(ProductListItem::new(&product, None, "/media/")).unwrap();
        assert_eq!(value["price"], "49.99");
        assert_eq!(value["category"], "orthodontics");
        assert!(value["primary_image"].is_null());
    }
}
