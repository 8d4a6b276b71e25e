//! Blog types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dental_com_core::{BlogCategoryId, BlogPostId, BlogStatus, BlogTagId, UserId};

use super::media_url;
use super::user::UserSummary;

pub const META_TITLE_MAX: usize = 60;
pub const META_DESCRIPTION_MAX: usize = 160;
pub const META_KEYWORDS_MAX: usize = 255;
pub const MAX_KEYWORDS: usize = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogCategory {
    pub id: BlogCategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogTag {
    pub id: BlogTagId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Tag row tagged with the post it belongs to, for batch loading.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostTag {
    pub post_id: BlogPostId,
    #[sqlx(flatten)]
    pub tag: BlogTag,
}

/// A blog post joined with its author and category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub image: Option<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub author_id: UserId,
    pub category_id: Option<BlogCategoryId>,
    pub status: BlogStatus,
    pub featured: bool,
    pub view_count: i32,
    pub number_of_likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_email: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub category_description: Option<String>,
    pub category_created_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    #[must_use]
    pub fn author(&self) -> UserSummary {
        UserSummary {
            id: self.author_id,
            username: self.author_username.clone(),
            first_name: self.author_first_name.clone(),
            last_name: self.author_last_name.clone(),
            email: self.author_email.clone(),
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<BlogCategory> {
        Some(BlogCategory {
            id: self.category_id?,
            name: self.category_name.clone()?,
            slug: self.category_slug.clone()?,
            description: self.category_description.clone().unwrap_or_default(),
            created_at: self.category_created_at?,
        })
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == BlogStatus::Published
    }
}

/// Split comma-separated keywords, dropping blanks.
#[must_use]
pub fn keywords_list(meta_keywords: &str) -> Vec<String> {
    meta_keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// First `max` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPostListView {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub author: UserSummary,
    pub status: BlogStatus,
    pub featured: bool,
    pub view_count: i32,
    pub number_of_likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Option<BlogCategory>,
    pub tags: Vec<BlogTag>,
}

impl BlogPostListView {
    #[must_use]
    pub fn new(post: &BlogPost, tags: Vec<BlogTag>, media_prefix: &str) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            description: post.description.clone(),
            image: post.image.as_deref().map(|path| media_url(media_prefix, path)),
            meta_title: post.meta_title.clone(),
            meta_description: post.meta_description.clone(),
            author: post.author(),
            status: post.status,
            featured: post.featured,
            view_count: post.view_count,
            number_of_likes: post.number_of_likes,
            created_at: post.created_at,
            updated_at: post.updated_at,
            published_at: post.published_at,
            category: post.category(),
            tags,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPostDetailView {
    #[serde(flatten)]
    pub summary: BlogPostListView,
    pub content: String,
    pub meta_keywords: String,
    pub keywords_list: Vec<String>,
}

impl BlogPostDetailView {
    #[must_use]
    pub fn new(post: &BlogPost, tags: Vec<BlogTag>, media_prefix: &str) -> Self {
        Self {
            summary: BlogPostListView::new(post, tags, media_prefix),
            content: post.content.clone(),
            meta_keywords: post.meta_keywords.clone(),
            keywords_list: keywords_list(&post.meta_keywords),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_post() -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: BlogPostId::new(1),
            title: "Brushing 101".to_string(),
            slug: "brushing-101".to_string(),
            description: "How to brush".to_string(),
            content: "Twice a day.".to_string(),
            image: Some("blog/brush.png".to_string()),
            meta_title: "Brushing 101".to_string(),
            meta_description: "How to brush".to_string(),
            meta_keywords: "teeth, brushing ,, floss".to_string(),
            author_id: UserId::generate(),
            category_id: None,
            status: BlogStatus::Published,
            featured: false,
            view_count: 3,
            number_of_likes: 1,
            created_at: now,
            updated_at: now,
            published_at: Some(now),
            author_username: "admin".to_string(),
            author_first_name: "Admin".to_string(),
            author_last_name: "User".to_string(),
            author_email: Some("admin@example.com".to_string()),
            category_name: None,
            category_slug: None,
            category_description: None,
            category_created_at: None,
        }
    }

    #[test]
    fn test_keywords_list() {
        assert_eq!(keywords_list("teeth, brushing ,, floss"), ["teeth", "brushing", "floss"]);
        assert!(keywords_list("  ").is_empty());
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_category_absent_without_join() {
        assert!(sample_post().category().is_none());
    }

    #[test]
    fn test_category_present() {
        let post = BlogPost {
            category_id: Some(BlogCategoryId::new(2)),
            category_name: Some("Hygiene".to_string()),
            category_slug: Some("hygiene".to_string()),
            category_description: None,
            category_created_at: Some(Utc::now()),
            ..sample_post()
        };
        let category = post.category().unwrap();
        assert_eq!(category.slug, "hygiene");
        assert_eq!(category.description, "");
    }

    #[test]
    fn test_detail_view_flattens_summary() {
        let value =
            serde_json::to_value(BlogPostDetailView::new(&sample_post(), Vec::new(), "/media/"))
                .unwrap();
        assert_eq!(value["title"], "Brushing 101");
        assert_eq!(value["image"], "/media/blog/brush.png");
        assert_eq!(value["keywords_list"].as_array().unwrap().len(), 3);
        assert_eq!(value["author"]["username"], "admin");
        assert_eq!(value["status"], "published");
    }
}
