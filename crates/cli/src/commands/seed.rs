//! Seed the catalog from a YAML file.
//!
//! Every entry is upserted by slug, so re-running the same file updates the
//! rows in place. A blank slug is derived from the name: products and
//! services use the simple lowercase/hyphen rule, blog categories and tags
//! the strict slugify.
//!
//! ```yaml
//! products:
//!   - name: Soft Toothbrush
//!     description: Gentle on gums.
//!     price: "4.99"
//!     category: preventive
//!     images:
//!       - image: products/soft-toothbrush.jpg
//!         is_primary: true
//! services:
//!   - name: Teeth Whitening
//!     description: In-chair whitening in one visit.
//! blog_categories:
//!   - name: Oral Hygiene
//! blog_tags:
//!   - name: Flossing
//! ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use dental_com_core::{ProductCategory, simple_slug, slugify};
use dental_com_storefront::db::products::{ImageInput, ProductInput};
use dental_com_storefront::db::services::ServiceInput;
use dental_com_storefront::db::{BlogRepository, ProductRepository, ServiceRepository};

use super::{CliError, connect};

/// Top-level seed document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub services: Vec<ServiceSeed>,
    #[serde(default)]
    pub blog_categories: Vec<NamedSeed>,
    #[serde(default)]
    pub blog_tags: Vec<NamedSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default = "yes")]
    pub is_active: bool,
    #[serde(default)]
    pub on_sale: bool,
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(default)]
    pub is_top_rated: bool,
    #[serde(default)]
    pub images: Vec<ImageSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSeed {
    pub image: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSeed {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    #[serde(default = "yes")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub images: Vec<ServiceImageSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceImageSeed {
    pub image: String,
    pub alt_text: Option<String>,
}

/// A blog category or tag.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedSeed {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

const fn yes() -> bool {
    true
}

/// Counts of upserted rows.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub products: usize,
    pub services: usize,
    pub categories: usize,
    pub tags: usize,
}

/// A validated product ready for upsert.
#[derive(Debug)]
pub struct ProductRow {
    pub input: ProductInput,
    pub images: Vec<ImageInput>,
}

fn or_slug(slug: &str, name: &str, derive: fn(&str) -> String) -> String {
    let slug = slug.trim();
    if slug.is_empty() {
        derive(name)
    } else {
        slug.to_string()
    }
}

impl ProductSeed {
    fn validate(self, index: usize, errors: &mut Vec<String>) -> Option<ProductRow> {
        let label = format!("products[{index}] ({})", self.name);
        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push(format!("{label}: name is required"));
        }
        if self.price.is_sign_negative() {
            errors.push(format!("{label}: price must not be negative"));
        }
        if self.sale_price.is_some_and(|p| p.is_sign_negative()) {
            errors.push(format!("{label}: sale_price must not be negative"));
        }
        let category = ProductCategory::from_str(self.category.trim())
            .map_err(|e| errors.push(format!("{label}: {e}")))
            .ok();
        let image_errors = self
            .images
            .iter()
            .filter(|img| img.image.trim().is_empty())
            .count();
        if image_errors > 0 {
            errors.push(format!("{label}: every image needs a path"));
        }

        let category = category.filter(|_| !name.is_empty() && image_errors == 0)?;
        let slug = or_slug(&self.slug, &name, simple_slug);
        Some(ProductRow {
            input: ProductInput {
                name,
                slug,
                description: self.description.trim().to_string(),
                price: self.price,
                category,
                is_active: self.is_active,
                on_sale: self.on_sale,
                sale_price: self.sale_price,
                sale_start: self.sale_start,
                sale_end: self.sale_end,
                is_featured: self.is_featured,
                is_new: self.is_new,
                is_best_seller: self.is_best_seller,
                is_top_rated: self.is_top_rated,
            },
            images: self
                .images
                .into_iter()
                .map(|img| ImageInput {
                    image: img.image.trim().to_string(),
                    alt_text: img.alt_text,
                    is_primary: img.is_primary,
                })
                .collect(),
        })
    }
}

impl ServiceSeed {
    fn validate(
        self,
        index: usize,
        errors: &mut Vec<String>,
    ) -> Option<(ServiceInput, Vec<(String, Option<String>)>)> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push(format!("services[{index}]: name is required"));
            return None;
        }
        let slug = or_slug(&self.slug, &name, simple_slug);
        let images = self
            .images
            .into_iter()
            .map(|img| (img.image.trim().to_string(), img.alt_text))
            .collect();
        Some((
            ServiceInput {
                name,
                slug,
                description: self.description.trim().to_string(),
                meta_description: self.meta_description,
                meta_keywords: self.meta_keywords,
                is_active: self.is_active,
                is_featured: self.is_featured,
                is_new: self.is_new,
            },
            images,
        ))
    }
}

/// Validated rows for every section of a catalog.
#[derive(Debug, Default)]
pub struct ValidCatalog {
    pub products: Vec<ProductRow>,
    pub services: Vec<(ServiceInput, Vec<(String, Option<String>)>)>,
    /// `(name, slug, description)`
    pub categories: Vec<(String, String, String)>,
    /// `(name, slug)`
    pub tags: Vec<(String, String)>,
}

impl Catalog {
    /// Validate every entry, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidSeed` listing each invalid entry.
    pub fn validate(self) -> Result<ValidCatalog, CliError> {
        let mut errors = Vec::new();
        let mut valid = ValidCatalog::default();

        for (i, product) in self.products.into_iter().enumerate() {
            if let Some(row) = product.validate(i, &mut errors) {
                valid.products.push(row);
            }
        }
        for (i, service) in self.services.into_iter().enumerate() {
            if let Some(row) = service.validate(i, &mut errors) {
                valid.services.push(row);
            }
        }
        for (i, category) in self.blog_categories.into_iter().enumerate() {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                errors.push(format!("blog_categories[{i}]: name is required"));
                continue;
            }
            let slug = or_slug(&category.slug, &name, slugify);
            valid.categories.push((name, slug, category.description));
        }
        for (i, tag) in self.blog_tags.into_iter().enumerate() {
            let name = tag.name.trim().to_string();
            if name.is_empty() {
                errors.push(format!("blog_tags[{i}]: name is required"));
                continue;
            }
            let slug = or_slug(&tag.slug, &name, slugify);
            valid.tags.push((name, slug));
        }

        if errors.is_empty() {
            Ok(valid)
        } else {
            Err(CliError::InvalidSeed(errors))
        }
    }
}

/// Parse a catalog document.
///
/// # Errors
///
/// Returns `CliError::Yaml` for malformed documents or unknown keys.
pub fn parse(content: &str) -> Result<Catalog, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Seed the catalog from `file_path`.
///
/// The whole file is validated before the database is touched.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails validation, or a
/// database write fails.
pub async fn run(file_path: &str) -> Result<SeedSummary, CliError> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let catalog = parse(&content)?.validate()?;
    info!(path = %file_path, "Seed file validated");

    let pool = connect().await?;
    let mut summary = SeedSummary::default();

    let products = ProductRepository::new(&pool);
    for row in &catalog.products {
        let product = products.upsert(&row.input).await?;
        if !row.images.is_empty() {
            products
                .update(product.id, &row.input, Some(&row.images))
                .await?;
        }
        info!(slug = %product.slug, "Product seeded");
        summary.products += 1;
    }

    let services = ServiceRepository::new(&pool);
    for (input, images) in &catalog.services {
        let service = services.upsert(input).await?;
        services.replace_images(service.id, images).await?;
        info!(slug = %service.slug, "Service seeded");
        summary.services += 1;
    }

    let blog = BlogRepository::new(&pool);
    for (name, slug, description) in &catalog.categories {
        blog.upsert_category(name, slug, description).await?;
        summary.categories += 1;
    }
    for (name, slug) in &catalog.tags {
        blog.upsert_tag(name, slug).await?;
        summary.tags += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
products:
  - name: Soft Toothbrush
    description: Gentle on gums.
    price: "4.99"
    category: preventive
    images:
      - image: products/soft-toothbrush.jpg
        is_primary: true
services:
  - name: Teeth Whitening
    description: In-chair whitening.
    images:
      - image: services/whitening.jpg
blog_categories:
  - name: Oral Hygiene!
blog_tags:
  - name: Flossing Tips
    slug: flossing
"#;

    #[test]
    fn test_sample_catalog_validates() {
        let catalog = parse(SAMPLE).unwrap().validate().unwrap();

        let product = &catalog.products[0];
        assert_eq!(product.input.slug, "soft-toothbrush");
        assert_eq!(product.input.category, ProductCategory::Preventive);
        assert!(product.input.is_active);
        assert_eq!(product.images.len(), 1);

        assert_eq!(catalog.services[0].0.slug, "teeth-whitening");
        assert_eq!(catalog.categories[0].1, "oral-hygiene");
        assert_eq!(catalog.tags[0], ("Flossing Tips".to_string(), "flossing".to_string()));
    }

    #[test]
    fn test_reports_every_invalid_entry() {
        let yaml = r#"
products:
  - name: Mystery Gel
    price: "-1"
    category: whitening
blog_tags:
  - name: "  "
"#;
        let Err(CliError::InvalidSeed(errors)) = parse(yaml).unwrap().validate() else {
            panic!("invalid catalog accepted");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("price must not be negative"));
        assert!(errors[1].contains("whitening"));
        assert!(errors[2].starts_with("blog_tags[0]"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            parse("products: []\ncoupons: []\n"),
            Err(CliError::Yaml(_))
        ));
    }
}
