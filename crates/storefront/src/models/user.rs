//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dental_com_core::UserId;

/// A storefront account.
///
/// Guests are created per browser session; Google users are keyed by their
/// Google subject ID; reviewers are created on demand by username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_guest: bool,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub guest_session_id: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown in logs and the Sentry scope.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.is_guest {
            return format!(
                "Guest User: {}",
                self.guest_session_id.as_deref().unwrap_or_default()
            );
        }
        self.email
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.username.clone())
    }
}

/// Full user representation returned by the auth endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_guest: bool,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_guest: user.is_guest,
            google_id: user.google_id.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: user.created_at,
        }
    }
}

/// Compact author/reviewer representation nested in reviews and blog posts.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Split a reviewer's username into first and last name on the first space.
#[must_use]
pub fn split_name(username: &str) -> (String, String) {
    let mut parts = username.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}
