//! Blog repository: posts, categories and tags.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use dental_com_core::{BlogCategoryId, BlogPostId, BlogStatus, BlogTagId, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::blog::{BlogCategory, BlogPost, BlogTag, PostTag};

const POST_SELECT: &str = "SELECT p.id, p.title, p.slug, p.description, p.content, p.image, \
     p.meta_title, p.meta_description, p.meta_keywords, p.author_id, p.category_id, p.status, \
     p.featured, p.view_count, p.number_of_likes, p.created_at, p.updated_at, p.published_at, \
     u.username AS author_username, u.first_name AS author_first_name, \
     u.last_name AS author_last_name, u.email AS author_email, \
     c.name AS category_name, c.slug AS category_slug, \
     c.description AS category_description, c.created_at AS category_created_at \
     FROM storefront.blog_posts p \
     JOIN storefront.users u ON u.id = p.author_id \
     LEFT JOIN storefront.blog_categories c ON c.id = p.category_id";

const SLUG_CONFLICT: &str = "blog post with this slug already exists.";

/// Sortable post columns accepted by `?ordering=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrdering {
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ViewCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSort {
    pub field: PostOrdering,
    pub descending: bool,
}

impl Default for PostSort {
    fn default() -> Self {
        Self {
            field: PostOrdering::CreatedAt,
            descending: true,
        }
    }
}

impl PostSort {
    /// Parse `-view_count` and friends; unknown fields sort newest first.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::default();
        };
        let (descending, field) = raw
            .strip_prefix('-')
            .map_or((false, raw), |rest| (true, rest));
        let field = match field {
            "created_at" => PostOrdering::CreatedAt,
            "updated_at" => PostOrdering::UpdatedAt,
            "published_at" => PostOrdering::PublishedAt,
            "view_count" => PostOrdering::ViewCount,
            _ => return Self::default(),
        };
        Self { field, descending }
    }

    fn sql(self) -> &'static str {
        match (self.field, self.descending) {
            (PostOrdering::CreatedAt, false) => "p.created_at ASC, p.id ASC",
            (PostOrdering::CreatedAt, true) => "p.created_at DESC, p.id DESC",
            (PostOrdering::UpdatedAt, false) => "p.updated_at ASC, p.id ASC",
            (PostOrdering::UpdatedAt, true) => "p.updated_at DESC, p.id DESC",
            (PostOrdering::PublishedAt, false) => "p.published_at ASC NULLS LAST, p.id ASC",
            (PostOrdering::PublishedAt, true) => "p.published_at DESC NULLS LAST, p.id DESC",
            (PostOrdering::ViewCount, false) => "p.view_count ASC, p.id ASC",
            (PostOrdering::ViewCount, true) => "p.view_count DESC, p.id DESC",
        }
    }
}

/// Filters for post listings. Archived posts are always excluded.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<BlogStatus>,
    pub published_only: bool,
    pub featured: Option<bool>,
    pub author: Option<UserId>,
    pub category_id: Option<BlogCategoryId>,
    pub category_slug: Option<String>,
    pub tag_slug: Option<String>,
    /// Case-insensitive match on title, description, content or keywords.
    pub search: Option<String>,
    pub sort: PostSort,
}

/// Complete column values for inserting or replacing a post.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub image: Option<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub category_id: Option<BlogCategoryId>,
    pub status: BlogStatus,
    pub featured: bool,
}

impl From<&BlogPost> for PostInput {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            description: post.description.clone(),
            content: post.content.clone(),
            image: post.image.clone(),
            meta_title: post.meta_title.clone(),
            meta_description: post.meta_description.clone(),
            meta_keywords: post.meta_keywords.clone(),
            category_id: post.category_id,
            status: post.status,
            featured: post.featured,
        }
    }
}

/// Which counter a like/view endpoint touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    View,
    Like,
    Unlike,
}

/// Repository for blog database operations.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Posts matching `filter`, one page plus the total count.
    ///
    /// `limit` of `None` returns every match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &PostFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<BlogPost>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM storefront.blog_posts p \
             LEFT JOIN storefront.blog_categories c ON c.id = p.category_id",
        );
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_filters(&mut query, filter);
        query.push(" ORDER BY ");
        query.push(filter.sort.sql());
        if let Some(limit) = limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        query.push(" OFFSET ");
        query.push_bind(offset);

        let posts = query
            .build_query_as::<BlogPost>()
            .fetch_all(self.pool)
            .await?;
        Ok((posts, total))
    }

    /// Get a post by ID, including archived posts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Tags of one post, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags_of(&self, post_id: BlogPostId) -> Result<Vec<BlogTag>, RepositoryError> {
        let mut grouped = self.tags_for(&[post_id]).await?;
        Ok(grouped.remove(&post_id).unwrap_or_default())
    }

    /// Tags of several posts grouped by post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags_for(
        &self,
        post_ids: &[BlogPostId],
    ) -> Result<HashMap<BlogPostId, Vec<BlogTag>>, RepositoryError> {
        let raw: Vec<i32> = post_ids.iter().map(BlogPostId::as_i32).collect();
        let rows = sqlx::query_as::<_, PostTag>(
            "SELECT pt.post_id, t.id, t.name, t.slug, t.created_at
             FROM storefront.blog_post_tags pt
             JOIN storefront.blog_tags t ON t.id = pt.tag_id
             WHERE pt.post_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<BlogPostId, Vec<BlogTag>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(row.tag);
        }
        Ok(grouped)
    }

    /// Insert a post with its tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &PostInput,
        author_id: UserId,
        tag_ids: &[BlogTagId],
    ) -> Result<BlogPostId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: BlogPostId = sqlx::query_scalar(
            "INSERT INTO storefront.blog_posts
                 (title, slug, description, content, image, meta_title, meta_description,
                  meta_keywords, category_id, status, featured, author_id, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     CASE WHEN $10 = 'published'::storefront.blog_status THEN NOW() END)
             RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.content)
        .bind(input.image.as_deref())
        .bind(&input.meta_title)
        .bind(&input.meta_description)
        .bind(&input.meta_keywords)
        .bind(input.category_id)
        .bind(input.status)
        .bind(input.featured)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, SLUG_CONFLICT))?;

        replace_tags(&mut tx, id, tag_ids).await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Replace a post's columns and author; when `tag_ids` is given, replace its tags.
    ///
    /// `published_at` is stamped the first time the post becomes published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: BlogPostId,
        input: &PostInput,
        author_id: UserId,
        tag_ids: Option<&[BlogTagId]>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE storefront.blog_posts
             SET title = $2, slug = $3, description = $4, content = $5, image = $6,
                 meta_title = $7, meta_description = $8, meta_keywords = $9,
                 category_id = $10, status = $11, featured = $12, author_id = $13,
                 published_at = CASE
                     WHEN $11 = 'published'::storefront.blog_status AND published_at IS NULL
                     THEN NOW()
                     ELSE published_at
                 END,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.content)
        .bind(input.image.as_deref())
        .bind(&input.meta_title)
        .bind(&input.meta_description)
        .bind(&input.meta_keywords)
        .bind(input.category_id)
        .bind(input.status)
        .bind(input.featured)
        .bind(author_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, SLUG_CONFLICT))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(tag_ids) = tag_ids {
            replace_tags(&mut tx, id, tag_ids).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Mark a post archived and attribute it to `author_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn archive(&self, id: BlogPostId, author_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.blog_posts
             SET status = 'archived', author_id = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(author_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Bump a counter, returning its new value. Likes never drop below zero.
    ///
    /// When `author_id` is given the post is reattributed in the same update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn bump(
        &self,
        id: BlogPostId,
        counter: Counter,
        author_id: Option<UserId>,
    ) -> Result<i32, RepositoryError> {
        let sql = match counter {
            Counter::View => {
                "UPDATE storefront.blog_posts
                 SET view_count = view_count + 1, author_id = COALESCE($2, author_id)
                 WHERE id = $1 RETURNING view_count"
            }
            Counter::Like => {
                "UPDATE storefront.blog_posts
                 SET number_of_likes = number_of_likes + 1, author_id = COALESCE($2, author_id)
                 WHERE id = $1 RETURNING number_of_likes"
            }
            Counter::Unlike => {
                "UPDATE storefront.blog_posts
                 SET number_of_likes = GREATEST(number_of_likes - 1, 0),
                     author_id = COALESCE($2, author_id)
                 WHERE id = $1 RETURNING number_of_likes"
            }
        };
        sqlx::query_scalar(sql)
            .bind(id)
            .bind(author_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Whether a category exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_exists(&self, id: BlogCategoryId) -> Result<bool, RepositoryError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM storefront.blog_categories WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?)
    }

    /// The subset of `ids` that name existing tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_tag_ids(
        &self,
        ids: &[BlogTagId],
    ) -> Result<Vec<BlogTagId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(BlogTagId::as_i32).collect();
        Ok(sqlx::query_scalar(
            "SELECT id FROM storefront.blog_tags WHERE id = ANY($1) ORDER BY id",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?)
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<BlogCategory>, RepositoryError> {
        Ok(sqlx::query_as::<_, BlogCategory>(
            "SELECT id, name, slug, description, created_at
             FROM storefront.blog_categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?)
    }

    /// All tags by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags(&self) -> Result<Vec<BlogTag>, RepositoryError> {
        Ok(sqlx::query_as::<_, BlogTag>(
            "SELECT id, name, slug, created_at FROM storefront.blog_tags ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?)
    }

    /// Insert or update a category keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another category has the name.
    pub async fn upsert_category(
        &self,
        name: &str,
        slug: &str,
        description: &str,
    ) -> Result<BlogCategory, RepositoryError> {
        sqlx::query_as::<_, BlogCategory>(
            "INSERT INTO storefront.blog_categories (name, slug, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description
             RETURNING id, name, slug, description, created_at",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "blog category name already exists"))
    }

    /// Insert or update a tag keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another tag has the name.
    pub async fn upsert_tag(&self, name: &str, slug: &str) -> Result<BlogTag, RepositoryError> {
        sqlx::query_as::<_, BlogTag>(
            "INSERT INTO storefront.blog_tags (name, slug)
             VALUES ($1, $2)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name, slug, created_at",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "blog tag name already exists"))
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    query.push(" WHERE p.status <> 'archived'");
    if filter.published_only {
        query.push(" AND p.status = 'published'");
    }
    if let Some(status) = filter.status {
        query.push(" AND p.status = ");
        query.push_bind(status);
    }
    if let Some(featured) = filter.featured {
        query.push(" AND p.featured = ");
        query.push_bind(featured);
    }
    if let Some(author) = filter.author {
        query.push(" AND p.author_id = ");
        query.push_bind(author);
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND p.category_id = ");
        query.push_bind(category_id);
    }
    if let Some(slug) = filter.category_slug.clone() {
        query.push(" AND c.slug = ");
        query.push_bind(slug);
    }
    if let Some(slug) = filter.tag_slug.clone() {
        query.push(
            " AND EXISTS (SELECT 1 FROM storefront.blog_post_tags pt \
             JOIN storefront.blog_tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = p.id AND t.slug = ",
        );
        query.push_bind(slug);
        query.push(")");
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query.push(" AND (p.title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR p.description ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR p.content ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR p.meta_keywords ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: BlogPostId,
    tag_ids: &[BlogTagId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM storefront.blog_post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let raw: Vec<i32> = tag_ids.iter().map(BlogTagId::as_i32).collect();
    sqlx::query(
        "INSERT INTO storefront.blog_post_tags (post_id, tag_id)
         SELECT $1, UNNEST($2::INTEGER[])
         ON CONFLICT DO NOTHING",
    )
    .bind(post_id)
    .bind(raw)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_sort_parse() {
        assert_eq!(
            PostSort::parse(Some("-view_count")),
            PostSort {
                field: PostOrdering::ViewCount,
                descending: true
            }
        );
        assert_eq!(PostSort::parse(Some("title")), PostSort::default());
        assert_eq!(
            PostSort::parse(Some("published_at")).sql(),
            "p.published_at ASC NULLS LAST, p.id ASC"
        );
    }
}
