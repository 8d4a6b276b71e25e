//! Product review types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dental_com_core::{ProductId, Rating, ReviewId, UserId};

use super::product::ProductDetail;
use super::user::UserSummary;

/// A review joined with its author.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub is_archived: bool,
    pub is_verified_purchase: bool,
    pub is_helpful: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl Review {
    #[must_use]
    pub fn author(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }

    /// Star string; stored ratings are constrained to 1..=5.
    #[must_use]
    pub fn rating_display(&self) -> String {
        Rating::new(self.rating).map(Rating::stars).unwrap_or_default()
    }

    /// Whether `username` and `email` identify this review's author.
    #[must_use]
    pub fn is_authored_by(&self, username: &str, email: &str) -> bool {
        self.username == username && self.email.as_deref() == Some(email)
    }
}

/// Review representation in lists.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewListItem {
    pub id: ReviewId,
    pub user: UserSummary,
    pub rating: i32,
    pub rating_display: String,
    pub title: String,
    pub comment: String,
    pub is_verified_purchase: bool,
    pub is_helpful: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewListItem {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            user: review.author(),
            rating: review.rating,
            rating_display: review.rating_display(),
            title: review.title.clone(),
            comment: review.comment.clone(),
            is_verified_purchase: review.is_verified_purchase,
            is_helpful: review.is_helpful,
            created_at: review.created_at,
        }
    }
}

/// Full review representation, embedding the product.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewDetail {
    pub id: ReviewId,
    pub product: ProductDetail,
    pub user: UserSummary,
    pub rating: i32,
    pub rating_display: String,
    pub title: String,
    pub comment: String,
    pub is_archived: bool,
    pub is_verified_purchase: bool,
    pub is_helpful: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewDetail {
    #[must_use]
    pub fn new(review: &Review, product: ProductDetail) -> Self {
        Self {
            id: review.id,
            product,
            user: review.author(),
            rating: review.rating,
            rating_display: review.rating_display(),
            title: review.title.clone(),
            comment: review.comment.clone(),
            is_archived: review.is_archived,
            is_verified_purchase: review.is_verified_purchase,
            is_helpful: review.is_helpful,
            is_active: !review.is_archived,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RatingCount {
    pub rating: i32,
    pub count: i64,
}

/// Aggregates over a product's active reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStatistics {
    pub total_reviews: i64,
    pub average_rating: f64,
    pub rating_distribution: Vec<RatingCount>,
}

impl ReviewStatistics {
    /// Build statistics from per-rating counts.
    ///
    /// The distribution is sorted by rating; the average is rounded to two
    /// decimals and is zero when there are no reviews.
    #[must_use]
    pub fn from_distribution(mut distribution: Vec<RatingCount>) -> Self {
        distribution.retain(|entry| entry.count > 0);
        distribution.sort_by_key(|entry| entry.rating);

        Self {
            total_reviews: distribution.iter().map(|entry| entry.count).sum(),
            average_rating: (mean_rating(&distribution) * 100.0).round() / 100.0,
            rating_distribution: distribution,
        }
    }
}

/// Unrounded mean rating over per-rating counts; zero when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
pub fn mean_rating(distribution: &[RatingCount]) -> f64 {
    let total: i64 = distribution.iter().map(|entry| entry.count).sum();
    if total <= 0 {
        return 0.0;
    }
    let weighted: i64 = distribution
        .iter()
        .map(|entry| i64::from(entry.rating) * entry.count)
        .sum();
    weighted as f64 / total as f64
}
