//! Product review API.
//!
//! Reviews are written anonymously: the body names the reviewer by
//! `username` and `email`, and updates must repeat both to prove authorship.

use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use dental_com_core::{Email, ProductId, ReviewId};

use super::pagination::{LimitOffset, LimitOffsetParams, PageUrl, Paginated};
use super::validation::{BLANK, REQUIRED, max_length_message};
use super::{JsonBody, PathParams, QueryParams, optional_json};
use crate::db::reviews::{DUPLICATE_REVIEW, ReviewFilter, ReviewInput};
use crate::db::{ProductRepository, RepositoryError, ReviewRepository, UserRepository};
use crate::error::{AppError, FieldErrors, NON_FIELD_ERRORS, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::product::{Product, ProductDetail, ProductRef};
use crate::models::review::{
    RatingCount, Review, ReviewDetail, ReviewListItem, ReviewStatistics, mean_rating,
};
use crate::state::AppState;

const TITLE_MAX: usize = 200;
const TITLE_MIN: usize = 3;
const COMMENT_MIN: usize = 10;
const USERNAME_MAX: usize = 150;
const RECENT_REVIEWS: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub rating: Option<String>,
    pub verified: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ReviewListQuery {
    /// The `rating` filter, ignored unless it is a whole number 1..=5.
    fn rating(&self) -> Option<i32> {
        self.rating
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .filter(|r| (1..=5).contains(r))
    }

    fn verified_only(&self) -> bool {
        self.verified
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn window(&self) -> LimitOffset {
        LimitOffset::from_params(&LimitOffsetParams {
            limit: self.limit.clone(),
            offset: self.offset.clone(),
        })
    }
}

/// Review create/update body.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewWriteRequest {
    pub product_id: Option<i64>,
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_verified_purchase: Option<bool>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl ReviewWriteRequest {
    /// The non-blank `username` and `email`, if both were sent.
    fn identity(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let email = self.email.as_deref().filter(|e| !e.is_empty())?;
        Some((username, email))
    }

    /// Validate the review content, keeping `existing` values for absent fields on PATCH.
    fn content(
        &self,
        errors: &mut FieldErrors,
        existing: Option<&Review>,
        partial: bool,
    ) -> Option<ReviewInput> {
        let required = !partial || existing.is_none();

        let rating = match self.rating {
            Some(r) if (1..=5).contains(&r) => Some(r),
            Some(_) => {
                errors.add("rating", "Rating must be between 1 and 5 stars.");
                None
            }
            None if required => {
                errors.add("rating", REQUIRED);
                None
            }
            None => existing.map(|r| r.rating),
        };
        let title = match self.title.as_deref() {
            Some(raw) => check_title(errors, raw),
            None if required => {
                errors.add("title", REQUIRED);
                None
            }
            None => existing.map(|r| r.title.clone()),
        };
        let comment = match self.comment.as_deref() {
            Some(raw) => check_comment(errors, raw),
            None if required => {
                errors.add("comment", REQUIRED);
                None
            }
            None => existing.map(|r| r.comment.clone()),
        };
        let is_verified_purchase = self
            .is_verified_purchase
            .or_else(|| existing.map(|r| r.is_verified_purchase))
            .unwrap_or(false);

        Some(ReviewInput {
            rating: rating?,
            title: title?,
            comment: comment?,
            is_verified_purchase,
        })
    }
}

fn check_title(errors: &mut FieldErrors, raw: &str) -> Option<String> {
    let title = raw.trim();
    let len = title.chars().count();
    let message = if title.is_empty() {
        "Title cannot be empty.".to_string()
    } else if len < TITLE_MIN {
        "Title must be at least 3 characters long.".to_string()
    } else if len > TITLE_MAX {
        max_length_message(TITLE_MAX)
    } else {
        return Some(title.to_string());
    };
    errors.add("title", message);
    None
}

fn check_comment(errors: &mut FieldErrors, raw: &str) -> Option<String> {
    let comment = raw.trim();
    if comment.is_empty() {
        errors.add("comment", "Comment cannot be empty.");
        None
    } else if comment.chars().count() < COMMENT_MIN {
        errors.add("comment", "Comment must be at least 10 characters long.");
        None
    } else {
        Some(comment.to_string())
    }
}

/// Validate the reviewer fields of a create body.
fn check_reviewer(errors: &mut FieldErrors, body: &ReviewWriteRequest) -> Option<(String, Email)> {
    let username = match body.username.as_deref().map(str::trim) {
        None => {
            errors.add("username", REQUIRED);
            None
        }
        Some("") => {
            errors.add("username", BLANK);
            None
        }
        Some(u) if u.chars().count() > USERNAME_MAX => {
            errors.add("username", max_length_message(USERNAME_MAX));
            None
        }
        Some(u) => Some(u.to_string()),
    };
    let email = match body.email.as_deref().map(str::trim) {
        None => {
            errors.add("email", REQUIRED);
            None
        }
        Some("") => {
            errors.add("email", BLANK);
            None
        }
        Some(e) => Email::parse(e)
            .map_err(|_| errors.add("email", "Enter a valid email address."))
            .ok(),
    };
    Some((username?, email?))
}

#[derive(Debug, Serialize)]
pub struct ProductReviews {
    pub product: ProductRef,
    pub statistics: ReviewStatistics,
    pub reviews: Vec<ReviewListItem>,
}

#[derive(Debug, Serialize)]
pub struct ReviewStatsResponse {
    pub product: ProductRef,
    pub total_reviews: i64,
    pub average_rating: f64,
    pub rating_distribution: Vec<RatingCount>,
    pub verified_purchases: i64,
    pub recent_reviews: Vec<ReviewListItem>,
}

#[derive(Debug, Serialize)]
pub struct HelpfulResponse {
    pub message: &'static str,
    pub helpful_count: i32,
}

/// Count reviews per rating.
fn distribution(reviews: &[Review]) -> Vec<RatingCount> {
    let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
    for review in reviews {
        *counts.entry(review.rating).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(rating, count)| RatingCount { rating, count })
        .collect()
}

async fn product_or_404(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

async fn active_review(state: &AppState, product_id: ProductId, review_id: ReviewId) -> Result<Review> {
    ReviewRepository::new(state.pool())
        .get_active(product_id, review_id)
        .await?
        .ok_or_else(AppError::not_found)
}

async fn detail(state: &AppState, product: &Product, review: &Review) -> Result<ReviewDetail> {
    let images = ProductRepository::new(state.pool())
        .images(product.id)
        .await?;
    Ok(ReviewDetail::new(
        review,
        ProductDetail::new(product, &images, state.media_url()),
    ))
}

/// Every active review, newest first.
///
/// GET /api/reviews-list/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state))]
pub async fn all_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<ReviewListQuery>,
) -> Result<Json<Paginated<ReviewListItem>>> {
    let window = query.window();
    let filter = ReviewFilter {
        rating: query.rating(),
        ..ReviewFilter::default()
    };
    let (reviews, count) = ReviewRepository::new(state.pool())
        .list(filter, Some(window.limit), window.offset)
        .await?;
    let url = PageUrl::new(&state.config().base_url, &uri);
    Ok(Json(
        window.paginate(reviews.iter().map(ReviewListItem::from).collect(), count, &url),
    ))
}

/// A product's reviews with statistics over the filtered set.
///
/// GET /api/products/{product_id}/reviews/
///
/// # Errors
///
/// Returns a 404 when the product does not exist.
#[instrument(skip(state))]
pub async fn product_reviews(
    State(state): State<AppState>,
    PathParams(product_id): PathParams<ProductId>,
    QueryParams(query): QueryParams<ReviewListQuery>,
) -> Result<Json<ProductReviews>> {
    let product = product_or_404(&state, product_id).await?;
    let filter = ReviewFilter {
        product_id: Some(product_id),
        rating: query.rating(),
        verified_only: query.verified_only(),
        ..ReviewFilter::default()
    };
    let (reviews, _) = ReviewRepository::new(state.pool())
        .list(filter, None, 0)
        .await?;

    Ok(Json(ProductReviews {
        product: ProductRef::from(&product),
        statistics: ReviewStatistics::from_distribution(distribution(&reviews)),
        reviews: reviews.iter().map(ReviewListItem::from).collect(),
    }))
}

/// Create a review, restoring the reviewer's archived one if present.
///
/// POST /api/products/{product_id}/reviews/
///
/// # Errors
///
/// Returns a 404 for an unknown product, a 400 for invalid input or a
/// duplicate review.
#[instrument(skip(state, body))]
pub async fn create_review(
    State(state): State<AppState>,
    PathParams(product_id): PathParams<ProductId>,
    JsonBody(body): JsonBody<ReviewWriteRequest>,
) -> Result<(StatusCode, Json<ReviewDetail>)> {
    let product = product_or_404(&state, product_id).await?;

    let mut errors = FieldErrors::new();
    if body
        .product_id
        .is_some_and(|id| id != i64::from(product_id.as_i32()))
    {
        errors.add("product_id", "Product ID does not match the URL.");
    }
    let input = body.content(&mut errors, None, false);
    let reviewer = check_reviewer(&mut errors, &body);
    let (Some(input), Some((username, email))) = (input, reviewer) else {
        return Err(AppError::Validation(errors));
    };
    errors.into_result()?;

    let user = UserRepository::new(state.pool())
        .get_or_create_reviewer(&username, email.as_str())
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(msg) => AppError::field("email", msg),
            other => AppError::Database(other),
        })?;

    let repo = ReviewRepository::new(state.pool());
    let review_id = match repo.get_by_author(product_id, user.id).await? {
        Some(existing) if !existing.is_archived => {
            return Err(AppError::field(NON_FIELD_ERRORS, DUPLICATE_REVIEW));
        }
        Some(archived) => {
            repo.update(archived.id, &input, true).await?;
            info!(review_id = %archived.id, "Archived review restored");
            archived.id
        }
        None => repo.create(product_id, user.id, &input).await?,
    };

    let review = active_review(&state, product_id, review_id).await?;
    add_breadcrumb(
        "review",
        "Review created",
        &[("product_id", &product_id.to_string()), ("username", &username)],
    );
    info!(review_id = %review_id, rating = input.rating, "Review created");

    Ok((
        StatusCode::CREATED,
        Json(detail(&state, &product, &review).await?),
    ))
}

/// GET /api/products/{product_id}/reviews/{review_id}/
///
/// # Errors
///
/// Returns a 404 for a missing or archived review.
#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    PathParams((product_id, review_id)): PathParams<(ProductId, ReviewId)>,
) -> Result<Json<ReviewDetail>> {
    let review = active_review(&state, product_id, review_id).await?;
    let product = product_or_404(&state, product_id).await?;
    Ok(Json(detail(&state, &product, &review).await?))
}

/// Load an active review and check the body names its author.
async fn authored_review(
    state: &AppState,
    product_id: ProductId,
    review_id: ReviewId,
    body: &ReviewWriteRequest,
    action: &str,
) -> Result<Review> {
    let Some((username, email)) = body.identity() else {
        return Err(AppError::BadRequest(
            "Username and email are required".to_string(),
        ));
    };
    let review = active_review(state, product_id, review_id).await?;
    if !review.is_authored_by(username, email) {
        return Err(AppError::Forbidden(format!(
            "Invalid username or email. You can only {action} your own reviews"
        )));
    }
    Ok(review)
}

async fn write_review(
    state: &AppState,
    product_id: ProductId,
    review_id: ReviewId,
    body: ReviewWriteRequest,
    partial: bool,
) -> Result<Json<ReviewDetail>> {
    let review = authored_review(state, product_id, review_id, &body, "update").await?;

    let mut errors = FieldErrors::new();
    let input = body.content(&mut errors, Some(&review), partial);
    let Some(input) = input else {
        return Err(AppError::Validation(errors));
    };
    errors.into_result()?;

    ReviewRepository::new(state.pool())
        .update(review_id, &input, false)
        .await?;
    let review = active_review(state, product_id, review_id).await?;
    let product = product_or_404(state, product_id).await?;
    info!(review_id = %review_id, partial, "Review updated");
    Ok(Json(detail(state, &product, &review).await?))
}

/// PUT /api/products/{product_id}/reviews/{review_id}/
///
/// # Errors
///
/// Returns a 400 without identity, a 403 for someone else's review.
#[instrument(skip(state, body))]
pub async fn update_review(
    State(state): State<AppState>,
    PathParams((product_id, review_id)): PathParams<(ProductId, ReviewId)>,
    JsonBody(body): JsonBody<ReviewWriteRequest>,
) -> Result<Json<ReviewDetail>> {
    write_review(&state, product_id, review_id, body, false).await
}

/// PATCH /api/products/{product_id}/reviews/{review_id}/
///
/// # Errors
///
/// Returns a 400 without identity, a 403 for someone else's review.
#[instrument(skip(state, body))]
pub async fn patch_review(
    State(state): State<AppState>,
    PathParams((product_id, review_id)): PathParams<(ProductId, ReviewId)>,
    JsonBody(body): JsonBody<ReviewWriteRequest>,
) -> Result<Json<ReviewDetail>> {
    write_review(&state, product_id, review_id, body, true).await
}

/// Archive a review.
///
/// DELETE /api/products/{product_id}/reviews/{review_id}/
///
/// # Errors
///
/// Returns a 400 without identity, a 403 for someone else's review.
#[instrument(skip(state, body))]
pub async fn delete_review(
    State(state): State<AppState>,
    PathParams((product_id, review_id)): PathParams<(ProductId, ReviewId)>,
    body: Bytes,
) -> Result<Json<super::MessageResponse>> {
    let body: ReviewWriteRequest = optional_json(&body)?;
    authored_review(&state, product_id, review_id, &body, "delete").await?;
    ReviewRepository::new(state.pool())
        .archive(review_id)
        .await?;
    info!(review_id = %review_id, product_id = %product_id, "Review archived");
    Ok(Json(super::MessageResponse {
        message: "Review has been archived successfully",
    }))
}

/// GET /api/products/{product_id}/reviews/stats/
///
/// # Errors
///
/// Returns a 404 when the product does not exist.
#[instrument(skip(state))]
pub async fn review_stats(
    State(state): State<AppState>,
    PathParams(product_id): PathParams<ProductId>,
) -> Result<Json<ReviewStatsResponse>> {
    let product = product_or_404(&state, product_id).await?;
    let repo = ReviewRepository::new(state.pool());

    let stats = ReviewStatistics::from_distribution(repo.distribution(product_id).await?);
    let verified_purchases = repo.verified_count(product_id).await?;
    let filter = ReviewFilter {
        product_id: Some(product_id),
        ..ReviewFilter::default()
    };
    let (recent, _) = repo.list(filter, Some(RECENT_REVIEWS), 0).await?;

    Ok(Json(ReviewStatsResponse {
        product: ProductRef::from(&product),
        total_reviews: stats.total_reviews,
        average_rating: mean_rating(&stats.rating_distribution),
        rating_distribution: stats.rating_distribution,
        verified_purchases,
        recent_reviews: recent.iter().map(ReviewListItem::from).collect(),
    }))
}

/// POST /api/products/{product_id}/reviews/{review_id}/helpful/
///
/// # Errors
///
/// Returns a 404 for a missing or archived review.
#[instrument(skip(state, _user))]
pub async fn mark_helpful(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    PathParams((product_id, review_id)): PathParams<(ProductId, ReviewId)>,
) -> Result<Json<HelpfulResponse>> {
    let helpful_count = ReviewRepository::new(state.pool())
        .mark_helpful(product_id, review_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Review not found".to_string()),
            other => AppError::Database(other),
        })?;
    Ok(Json(HelpfulResponse {
        message: "Review marked as helpful",
        helpful_count,
    }))
}

/// The caller's active reviews.
///
/// GET /api/my-reviews/
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_reviews(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<ReviewListQuery>,
) -> Result<Json<Paginated<ReviewListItem>>> {
    let window = query.window();
    let filter = ReviewFilter {
        user_id: Some(user.id),
        ..ReviewFilter::default()
    };
    let (reviews, count) = ReviewRepository::new(state.pool())
        .list(filter, Some(window.limit), window.offset)
        .await?;
    let url = PageUrl::new(&state.config().base_url, &uri);
    Ok(Json(
        window.paginate(reviews.iter().map(ReviewListItem::from).collect(), count, &url),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn body(json: serde_json::Value) -> ReviewWriteRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_content_trims_and_validates() {
        let mut errors = FieldErrors::new();
        let input = body(serde_json::json!({
            "rating": 4,
            "title": "  Solid kit  ",
            "comment": "  Whitened in two weeks.  "
        }))
        .content(&mut errors, None, false)
        .unwrap();
        assert!(errors.is_empty());
        assert_eq!(input.title, "Solid kit");
        assert_eq!(input.comment, "Whitened in two weeks.");
        assert!(!input.is_verified_purchase);
    }

    #[test]
    fn test_content_messages() {
        let mut errors = FieldErrors::new();
        let input = body(serde_json::json!({
            "rating": 6,
            "title": "ok",
            "comment": "   "
        }))
        .content(&mut errors, None, false);
        assert!(input.is_none());
        assert_eq!(
            errors.get("rating"),
            Some(&["Rating must be between 1 and 5 stars.".to_string()][..])
        );
        assert_eq!(
            errors.get("title"),
            Some(&["Title must be at least 3 characters long.".to_string()][..])
        );
        assert_eq!(
            errors.get("comment"),
            Some(&["Comment cannot be empty.".to_string()][..])
        );
    }

    #[test]
    fn test_short_comment_rejected() {
        let mut errors = FieldErrors::new();
        assert!(check_comment(&mut errors, "too short").is_none());
        assert_eq!(
            errors.get("comment"),
            Some(&["Comment must be at least 10 characters long.".to_string()][..])
        );
    }

    #[test]
    fn test_reviewer_requires_valid_email() {
        let mut errors = FieldErrors::new();
        let reviewer = check_reviewer(
            &mut errors,
            &body(serde_json::json!({ "username": "Jane Doe", "email": "nope" })),
        );
        assert!(reviewer.is_none());
        assert!(errors.contains("email"));
        assert!(!errors.contains("username"));
    }

    #[test]
    fn test_identity_requires_both_fields() {
        assert!(body(serde_json::json!({ "username": "jane" })).identity().is_none());
        assert_eq!(
            body(serde_json::json!({ "username": "jane", "email": "j@x.io" })).identity(),
            Some(("jane", "j@x.io"))
        );
    }

    #[test]
    fn test_rating_filter_ignores_out_of_range() {
        let query = |raw: &str| ReviewListQuery {
            rating: Some(raw.to_string()),
            ..ReviewListQuery::default()
        };
        assert_eq!(query("4").rating(), Some(4));
        assert_eq!(query("9").rating(), None);
        assert_eq!(query("four").rating(), None);
    }

    #[test]
    fn test_distribution_counts_ratings_ascending() {
        let now = Utc::now();
        let review = |rating| Review {
            id: ReviewId::new(rating),
            product_id: ProductId::new(1),
            user_id: dental_com_core::UserId::generate(),
            rating,
            title: "Nice".to_string(),
            comment: "Really nice product".to_string(),
            is_archived: false,
            is_verified_purchase: false,
            is_helpful: 0,
            created_at: now,
            updated_at: now,
            username: "u".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
        };
        let counts = distribution(&[review(5), review(3), review(5)]);
        assert_eq!(
            counts,
            vec![
                RatingCount { rating: 3, count: 1 },
                RatingCount { rating: 5, count: 2 },
            ]
        );
    }
}
