//! Blog API.
//!
//! Reads and writes are open to anonymous callers. Anonymous callers only
//! see published posts, and their writes are attributed to the shared
//! `admin` author.

use std::str::FromStr;

use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use dental_com_core::{BlogCategoryId, BlogPostId, BlogStatus, BlogTagId, UserId, slugify};

use super::pagination::{LimitOffset, LimitOffsetParams, PageUrl, Paginated};
use super::validation::{self, max_length_message, optional_text, text};
use super::{JsonBody, MessageResponse, PathParams, QueryParams, double_option, optional_json, parse_bool};
use crate::db::blog::{Counter, PostFilter, PostInput, PostSort};
use crate::db::{BlogRepository, RepositoryError, UserRepository};
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::OptionalUser;
use crate::models::blog::{
    BlogCategory, BlogPost, BlogPostDetailView, BlogPostListView, BlogTag, MAX_KEYWORDS,
    META_DESCRIPTION_MAX, META_KEYWORDS_MAX, META_TITLE_MAX, keywords_list, truncate_chars,
};
use crate::models::user::User;
use crate::state::AppState;

const TITLE_MAX: usize = 200;
const IMAGE_MAX: usize = 100;
const QUERY_MAX: usize = 255;
const CATEGORY_SLUG_MAX: usize = 100;
const TAG_SLUG_MAX: usize = 50;
const POST_NOT_FOUND: &str = "Blog post not found";

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<String>,
    pub featured: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Post create/update body.
#[derive(Debug, Default, Deserialize)]
pub struct PostWriteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub status: Option<String>,
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i32>>,
    pub tag_ids: Option<Vec<i32>>,
}

/// Body of `POST /api/blog/posts/search/`.
#[derive(Debug, Default, Deserialize)]
pub struct PostSearchRequest {
    pub query: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub status: Option<String>,
    pub featured: Option<bool>,
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<BlogPostListView>,
    pub count: i64,
}

/// A validated post body; `category` and `tags` still need existence checks.
#[derive(Debug)]
pub struct ValidPost {
    pub input: PostInput,
    /// `None` keeps the stored category; `Some(None)` clears it.
    pub category: Option<Option<BlogCategoryId>>,
    pub tag_ids: Option<Vec<BlogTagId>>,
}

fn choice_message(raw: &str) -> String {
    format!("Select a valid choice. {raw} is not one of the available choices.")
}

impl PostWriteRequest {
    /// Validate into complete column values, keeping `existing` ones on PATCH.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every invalid field.
    pub fn validate(self, existing: Option<&BlogPost>, partial: bool) -> Result<ValidPost> {
        let mut errors = FieldErrors::new();
        let base = existing.map(PostInput::from);
        let required = !partial || base.is_none();

        let title = text(&mut errors, "title", self.title, Some(TITLE_MAX), required)
            .or_else(|| base.as_ref().map(|b| b.title.clone()));
        let description = text(&mut errors, "description", self.description, None, required)
            .or_else(|| base.as_ref().map(|b| b.description.clone()));
        let content = text(&mut errors, "content", self.content, None, required)
            .or_else(|| base.as_ref().map(|b| b.content.clone()));

        let image = match self.image {
            Some(Some(raw)) => optional_text(&mut errors, "image", Some(raw), IMAGE_MAX)
                .map(|img| Some(img).filter(|i| !i.is_empty())),
            Some(None) => Some(None),
            None => Some(base.as_ref().and_then(|b| b.image.clone())),
        };

        let meta_title = match self.meta_title {
            Some(raw) if raw.chars().count() > META_TITLE_MAX => {
                errors.add("meta_title", "Meta title should not exceed 60 characters.");
                None
            }
            Some(raw) => Some(raw.trim().to_string()),
            None => Some(base.as_ref().map(|b| b.meta_title.clone()).unwrap_or_default()),
        };
        let meta_description = match self.meta_description {
            Some(raw) if raw.chars().count() > META_DESCRIPTION_MAX => {
                errors.add(
                    "meta_description",
                    "Meta description should not exceed 160 characters.",
                );
                None
            }
            Some(raw) => Some(raw.trim().to_string()),
            None => Some(
                base.as_ref()
                    .map(|b| b.meta_description.clone())
                    .unwrap_or_default(),
            ),
        };
        let meta_keywords = match self.meta_keywords {
            Some(raw) if raw.chars().count() > META_KEYWORDS_MAX => {
                errors.add("meta_keywords", max_length_message(META_KEYWORDS_MAX));
                None
            }
            Some(raw) if keywords_list(&raw).len() > MAX_KEYWORDS => {
                errors.add("meta_keywords", "Maximum 10 keywords allowed.");
                None
            }
            Some(raw) => Some(raw.trim().to_string()),
            None => Some(base.as_ref().map(|b| b.meta_keywords.clone()).unwrap_or_default()),
        };

        let status = match self.status {
            Some(raw) => match BlogStatus::from_str(raw.trim()) {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", choice_message(&raw));
                    None
                }
            },
            None => Some(base.as_ref().map_or(BlogStatus::Draft, |b| b.status)),
        };

        let (
            Some(title),
            Some(description),
            Some(content),
            Some(image),
            Some(meta_title),
            Some(meta_description),
            Some(meta_keywords),
            Some(status),
        ) = (
            title,
            description,
            content,
            image,
            meta_title,
            meta_description,
            meta_keywords,
            status,
        )
        else {
            return Err(AppError::Validation(errors));
        };
        errors.into_result()?;

        let slug = base
            .as_ref()
            .map(|b| b.slug.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&title));
        let meta_title = if meta_title.is_empty() {
            truncate_chars(&title, META_TITLE_MAX)
        } else {
            meta_title
        };
        let meta_description = if meta_description.is_empty() {
            truncate_chars(&description, META_DESCRIPTION_MAX)
        } else {
            meta_description
        };

        // 0 and null both clear the category.
        let category = self
            .category_id
            .map(|id| id.filter(|id| *id != 0).map(BlogCategoryId::new));

        let input = PostInput {
            title,
            slug,
            description,
            content,
            image,
            meta_title,
            meta_description,
            meta_keywords,
            category_id: base.as_ref().and_then(|b| b.category_id),
            status,
            featured: self
                .featured
                .or_else(|| base.as_ref().map(|b| b.featured))
                .unwrap_or(false),
        };

        Ok(ValidPost {
            input,
            category,
            tag_ids: self
                .tag_ids
                .map(|ids| ids.into_iter().map(BlogTagId::new).collect()),
        })
    }
}

impl PostSearchRequest {
    fn into_filter(self, published_only: bool) -> Result<PostFilter> {
        let mut errors = FieldErrors::new();
        let query = text(&mut errors, "query", self.query, Some(QUERY_MAX), true);
        let category = text(&mut errors, "category", self.category, Some(CATEGORY_SLUG_MAX), false);
        let tag = text(&mut errors, "tag", self.tag, Some(TAG_SLUG_MAX), false);
        let status = validation::choice::<BlogStatus>(&mut errors, "status", self.status, false);
        let author = self.author.and_then(|raw| match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(UserId::from_uuid(id)),
            Err(_) => {
                errors.add("author", "Must be a valid UUID.");
                None
            }
        });
        let Some(query) = query else {
            return Err(AppError::Validation(errors));
        };
        errors.into_result()?;

        Ok(PostFilter {
            status,
            published_only,
            featured: self.featured,
            author,
            category_slug: category,
            tag_slug: tag,
            search: Some(query),
            ..PostFilter::default()
        })
    }
}

impl PostListQuery {
    fn into_filter(self, published_only: bool) -> Result<PostFilter> {
        let mut errors = FieldErrors::new();
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => BlogStatus::from_str(raw)
                .map_err(|_| errors.add("status", choice_message(raw)))
                .ok(),
        };
        let author = match self.author.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Uuid::parse_str(raw)
                .map(UserId::from_uuid)
                .map_err(|_| errors.add("author", choice_message(raw)))
                .ok(),
        };
        let category_id = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => raw
                .parse::<i32>()
                .map(BlogCategoryId::new)
                .map_err(|_| errors.add("category", choice_message(raw)))
                .ok(),
        };
        errors.into_result()?;

        Ok(PostFilter {
            status,
            published_only,
            featured: parse_bool(self.featured.as_deref()),
            author,
            category_id,
            search: self.search,
            sort: PostSort::parse(self.ordering.as_deref()),
            ..PostFilter::default()
        })
    }
}

/// The author to record for a write: the caller, or the shared admin.
async fn acting_author(state: &AppState, caller: Option<&User>) -> Result<UserId> {
    match caller {
        Some(user) => Ok(user.id),
        None => Ok(UserRepository::new(state.pool())
            .get_or_create_admin()
            .await?
            .id),
    }
}

/// Load a post visible to the caller: never archived, published only for anonymous callers.
async fn visible_post(state: &AppState, id: BlogPostId, caller: Option<&User>) -> Result<BlogPost> {
    BlogRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|post| post.status != BlogStatus::Archived)
        .filter(|post| caller.is_some() || post.is_published())
        .ok_or_else(AppError::not_found)
}

async fn detail_view(state: &AppState, id: BlogPostId) -> Result<BlogPostDetailView> {
    let repo = BlogRepository::new(state.pool());
    let post = repo.get(id).await?.ok_or_else(AppError::not_found)?;
    let tags = repo.tags_of(id).await?;
    Ok(BlogPostDetailView::new(&post, tags, state.media_url()))
}

async fn list_views(state: &AppState, posts: &[BlogPost]) -> Result<Vec<BlogPostListView>> {
    let ids: Vec<BlogPostId> = posts.iter().map(|p| p.id).collect();
    let mut tags = BlogRepository::new(state.pool()).tags_for(&ids).await?;
    Ok(posts
        .iter()
        .map(|post| {
            BlogPostListView::new(
                post,
                tags.remove(&post.id).unwrap_or_default(),
                state.media_url(),
            )
        })
        .collect())
}

/// Resolve the category and tag references of a validated body.
async fn resolve_refs(
    state: &AppState,
    valid: &mut ValidPost,
) -> Result<()> {
    let repo = BlogRepository::new(state.pool());
    match valid.category {
        Some(Some(id)) => {
            // Unknown categories are ignored.
            if repo.category_exists(id).await? {
                valid.input.category_id = Some(id);
            }
        }
        Some(None) => valid.input.category_id = None,
        None => {}
    }
    if let Some(ids) = valid.tag_ids.take() {
        valid.tag_ids = Some(repo.existing_tag_ids(&ids).await?);
    }
    Ok(())
}

fn slug_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(msg) => AppError::field("slug", msg),
        other => AppError::Database(other),
    }
}

/// GET /api/blog/posts/
///
/// # Errors
///
/// Returns a 400 for an invalid filter value.
#[instrument(skip(state, caller))]
pub async fn list_posts(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<PostListQuery>,
) -> Result<Json<Paginated<BlogPostListView>>> {
    let window = LimitOffset::from_params(&LimitOffsetParams {
        limit: query.limit.clone(),
        offset: query.offset.clone(),
    });
    let filter = query.into_filter(caller.is_none())?;
    let (posts, count) = BlogRepository::new(state.pool())
        .list(&filter, Some(window.limit), window.offset)
        .await?;
    let url = PageUrl::new(&state.config().base_url, &uri);
    Ok(Json(window.paginate(list_views(&state, &posts).await?, count, &url)))
}

/// POST /api/blog/posts/
///
/// # Errors
///
/// Returns a 400 for invalid input or a duplicate slug.
#[instrument(skip(state, caller, body))]
pub async fn create_post(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    JsonBody(body): JsonBody<PostWriteRequest>,
) -> Result<(StatusCode, Json<BlogPostDetailView>)> {
    let mut valid = body.validate(None, false)?;
    resolve_refs(&state, &mut valid).await?;
    let author = acting_author(&state, caller.as_ref()).await?;

    let id = BlogRepository::new(state.pool())
        .create(
            &valid.input,
            author,
            valid.tag_ids.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(slug_conflict)?;

    info!(post_id = %id, slug = %valid.input.slug, "Blog post created");
    Ok((StatusCode::CREATED, Json(detail_view(&state, id).await?)))
}

/// Post detail; each read counts as a view.
///
/// GET /api/blog/posts/{id}/
///
/// # Errors
///
/// Returns a 404 when the post is archived, missing or unpublished for
/// an anonymous caller.
#[instrument(skip(state, caller))]
pub async fn get_post(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
) -> Result<Json<BlogPostDetailView>> {
    visible_post(&state, id, caller.as_ref()).await?;
    BlogRepository::new(state.pool())
        .bump(id, Counter::View, None)
        .await?;
    Ok(Json(detail_view(&state, id).await?))
}

async fn write_post(
    state: &AppState,
    caller: Option<&User>,
    id: BlogPostId,
    body: PostWriteRequest,
    partial: bool,
) -> Result<Json<BlogPostDetailView>> {
    let existing = visible_post(state, id, caller).await?;
    let mut valid = body.validate(Some(&existing), partial)?;
    resolve_refs(state, &mut valid).await?;
    let author = match caller {
        Some(_) => existing.author_id,
        None => acting_author(state, None).await?,
    };

    BlogRepository::new(state.pool())
        .update(id, &valid.input, author, valid.tag_ids.as_deref())
        .await
        .map_err(slug_conflict)?;

    info!(post_id = %id, partial, "Blog post updated");
    Ok(Json(detail_view(state, id).await?))
}

/// PUT /api/blog/posts/{id}/
///
/// # Errors
///
/// Returns a 404 for an invisible post, a 400 for invalid input.
#[instrument(skip(state, caller, body))]
pub async fn update_post(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
    JsonBody(body): JsonBody<PostWriteRequest>,
) -> Result<Json<BlogPostDetailView>> {
    write_post(&state, caller.as_ref(), id, body, false).await
}

/// PATCH /api/blog/posts/{id}/
///
/// # Errors
///
/// Returns a 404 for an invisible post, a 400 for invalid input.
#[instrument(skip(state, caller, body))]
pub async fn patch_post(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
    JsonBody(body): JsonBody<PostWriteRequest>,
) -> Result<Json<BlogPostDetailView>> {
    write_post(&state, caller.as_ref(), id, body, true).await
}

/// Archive a post.
///
/// DELETE /api/blog/posts/{id}/
///
/// # Errors
///
/// Returns a 404 for an invisible post.
#[instrument(skip(state, caller))]
pub async fn delete_post(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
) -> Result<Json<MessageResponse>> {
    let existing = visible_post(&state, id, caller.as_ref()).await?;
    let author = match caller {
        Some(_) => existing.author_id,
        None => acting_author(&state, None).await?,
    };
    BlogRepository::new(state.pool()).archive(id, author).await?;
    info!(post_id = %id, "Blog post archived");
    Ok(Json(MessageResponse {
        message: "Blog post archived successfully",
    }))
}

/// POST /api/blog/posts/search/
///
/// # Errors
///
/// Returns a 400 when `query` is missing or a filter is invalid.
#[instrument(skip(state, caller, body))]
pub async fn search_posts(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    body: Bytes,
) -> Result<Json<SearchResults>> {
    let body: PostSearchRequest = optional_json(&body)?;
    let filter = body.into_filter(caller.is_none())?;
    let (posts, count) = BlogRepository::new(state.pool())
        .list(&filter, None, 0)
        .await?;
    Ok(Json(SearchResults {
        results: list_views(&state, &posts).await?,
        count,
    }))
}

/// GET /api/blog/posts/featured/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state))]
pub async fn featured_posts(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(params): QueryParams<LimitOffsetParams>,
) -> Result<Json<Paginated<BlogPostListView>>> {
    let window = LimitOffset::from_params(&params);
    let filter = PostFilter {
        published_only: true,
        featured: Some(true),
        ..PostFilter::default()
    };
    let (posts, count) = BlogRepository::new(state.pool())
        .list(&filter, Some(window.limit), window.offset)
        .await?;
    let url = PageUrl::new(&state.config().base_url, &uri);
    Ok(Json(window.paginate(list_views(&state, &posts).await?, count, &url)))
}

/// Bump a counter. Anonymous bumps hand the post over to the shared admin author.
async fn bump(
    state: &AppState,
    id: BlogPostId,
    counter: Counter,
    caller: Option<&User>,
) -> Result<()> {
    let author = match caller {
        Some(_) => None,
        None => Some(acting_author(state, None).await?),
    };
    BlogRepository::new(state.pool())
        .bump(id, counter, author)
        .await
        .map(|_| ())
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(POST_NOT_FOUND.to_string()),
            other => AppError::Database(other),
        })
}

/// POST /api/blog/posts/{id}/increment-view/
///
/// An anonymous call also reattributes the post to the `admin` author.
///
/// # Errors
///
/// Returns a 404 when the post does not exist.
#[instrument(skip(state, caller))]
pub async fn increment_view(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
) -> Result<Json<MessageResponse>> {
    bump(&state, id, Counter::View, caller.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "View count incremented successfully",
    }))
}

/// POST /api/blog/posts/{id}/increment-like/
///
/// # Errors
///
/// Returns a 404 when the post does not exist.
#[instrument(skip(state, caller))]
pub async fn increment_like(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
) -> Result<Json<MessageResponse>> {
    bump(&state, id, Counter::Like, caller.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "Like count incremented successfully",
    }))
}

/// POST /api/blog/posts/{id}/decrement-like/
///
/// # Errors
///
/// Returns a 404 when the post does not exist.
#[instrument(skip(state, caller))]
pub async fn decrement_like(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    PathParams(id): PathParams<BlogPostId>,
) -> Result<Json<MessageResponse>> {
    bump(&state, id, Counter::Unlike, caller.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "Like count decremented successfully",
    }))
}

/// GET /api/blog/categories/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<BlogCategory>>> {
    Ok(Json(BlogRepository::new(state.pool()).categories().await?))
}

/// GET /api/blog/tags/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<BlogTag>>> {
    Ok(Json(BlogRepository::new(state.pool()).tags().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> PostWriteRequest {
        serde_json::from_value(json).unwrap()
    }

    fn errors_of<T: std::fmt::Debug>(result: Result<T>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_fills_slug_and_meta_defaults() {
        let valid = body(serde_json::json!({
            "title": "Caring for Your Aligners!",
            "description": "Daily habits that keep clear aligners clear.",
            "content": "Rinse, brush, soak."
        }))
        .validate(None, false)
        .unwrap();

        assert_eq!(valid.input.slug, "caring-for-your-aligners");
        assert_eq!(valid.input.meta_title, "Caring for Your Aligners!");
        assert_eq!(
            valid.input.meta_description,
            "Daily habits that keep clear aligners clear."
        );
        assert_eq!(valid.input.status, BlogStatus::Draft);
        assert!(valid.category.is_none());
        assert!(valid.tag_ids.is_none());
    }

    #[test]
    fn test_meta_limits() {
        let errors = errors_of(
            body(serde_json::json!({
                "title": "t",
                "description": "d",
                "content": "c",
                "meta_title": "x".repeat(61),
                "meta_keywords": "a,b,c,d,e,f,g,h,i,j,k",
                "status": "live"
            }))
            .validate(None, false),
        );
        assert_eq!(
            errors.get("meta_title"),
            Some(&["Meta title should not exceed 60 characters.".to_string()][..])
        );
        assert_eq!(
            errors.get("meta_keywords"),
            Some(&["Maximum 10 keywords allowed.".to_string()][..])
        );
        assert!(errors.contains("status"));
    }

    #[test]
    fn test_category_zero_or_null_clears() {
        for raw in [serde_json::json!(0), serde_json::Value::Null] {
            let valid = body(serde_json::json!({ "category_id": raw }))
                .validate(Some(&sample_post()), true)
                .unwrap();
            assert_eq!(valid.category, Some(None));
        }
        let valid = body(serde_json::json!({}))
            .validate(Some(&sample_post()), true)
            .unwrap();
        assert!(valid.category.is_none());
        assert_eq!(valid.input.category_id, Some(BlogCategoryId::new(2)));
    }

    #[test]
    fn test_patch_keeps_slug_when_title_changes() {
        let valid = body(serde_json::json!({ "title": "A brand new title" }))
            .validate(Some(&sample_post()), true)
            .unwrap();
        assert_eq!(valid.input.title, "A brand new title");
        assert_eq!(valid.input.slug, "flossing-101");
        assert_eq!(valid.input.content, "Floss daily.");
    }

    #[test]
    fn test_search_requires_query() {
        let request = PostSearchRequest::default();
        let errors = errors_of(request.into_filter(true));
        assert_eq!(errors.get("query"), Some(&[validation::REQUIRED.to_string()][..]));

        let request = PostSearchRequest {
            query: Some("floss".into()),
            tag: Some("hygiene".into()),
            ..PostSearchRequest::default()
        };
        let filter = request.into_filter(true).unwrap();
        assert!(filter.published_only);
        assert_eq!(filter.search.as_deref(), Some("floss"));
        assert_eq!(filter.tag_slug.as_deref(), Some("hygiene"));
    }

    #[test]
    fn test_list_query_rejects_bad_status() {
        let query = PostListQuery {
            status: Some("gone".into()),
            ..PostListQuery::default()
        };
        let errors = errors_of(query.into_filter(false));
        assert_eq!(
            errors.get("status"),
            Some(&[choice_message("gone")][..])
        );
    }

    fn sample_post() -> BlogPost {
        let now = chrono::Utc::now();
        BlogPost {
            id: BlogPostId::new(1),
            title: "Flossing 101".to_string(),
            slug: "flossing-101".to_string(),
            description: "Basics".to_string(),
            content: "Floss daily.".to_string(),
            image: None,
            meta_title: "Flossing 101".to_string(),
            meta_description: "Basics".to_string(),
            meta_keywords: String::new(),
            author_id: UserId::generate(),
            category_id: Some(BlogCategoryId::new(2)),
            status: BlogStatus::Published,
            featured: false,
            view_count: 0,
            number_of_likes: 0,
            created_at: now,
            updated_at: now,
            published_at: Some(now),
            author_username: "admin".to_string(),
            author_first_name: "Admin".to_string(),
            author_last_name: "User".to_string(),
            author_email: None,
            category_name: Some("Hygiene".to_string()),
            category_slug: Some("hygiene".to_string()),
            category_description: Some(String::new()),
            category_created_at: Some(now),
        }
    }
}
