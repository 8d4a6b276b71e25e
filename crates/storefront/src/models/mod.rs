//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow`; the `*View` types are the JSON
//! representations returned by the API.

pub mod appointment;
pub mod blog;
pub mod cart;
pub mod product;
pub mod review;
pub mod service;
pub mod user;

/// Render a stored image path as a URL under `media_url`.
///
/// Absolute URLs (e.g. Google profile pictures or CDN paths) pass through.
#[must_use]
pub fn media_url(media_prefix: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{media_prefix}{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_prefixes_relative_paths() {
        assert_eq!(media_url("/media/", "products/a.jpg"), "/media/products/a.jpg");
        assert_eq!(media_url("/media/", "/products/a.jpg"), "/media/products/a.jpg");
    }

    #[test]
    fn test_media_url_keeps_absolute_urls() {
        assert_eq!(
            media_url("/media/", "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }
}
