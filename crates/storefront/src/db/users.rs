//! User repository for database operations.

use sqlx::PgPool;

use dental_com_core::UserId;

use super::RepositoryError;
use crate::models::user::{User, split_name};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, is_guest, google_id, \
     profile_picture, guest_session_id, is_active, is_staff, created_at, updated_at";

/// Username of the shared account that authors anonymous blog edits.
pub const ADMIN_USERNAME: &str = "admin";

/// Profile fields taken from a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get the guest user bound to a browser session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_guest_session(
        &self,
        session_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.users WHERE guest_session_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(session_id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get a user by Google subject ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.users WHERE google_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(google_id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Whether a username is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM storefront.users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a guest user bound to `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or session is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_guest(
        &self,
        session_id: &str,
        username: &str,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.users (id, username, is_guest, guest_session_id)
             VALUES ($1, $2, TRUE, $3)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(UserId::generate())
            .bind(username)
            .bind(session_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, "guest session already exists"))
    }

    /// Create a user from a Google profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username, email or Google ID is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_google(
        &self,
        username: &str,
        profile: &GoogleProfile,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.users
                 (id, username, email, first_name, last_name, google_id, profile_picture)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(UserId::generate())
            .bind(username)
            .bind(profile.email.as_deref())
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.google_id)
            .bind(profile.picture.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, "google account already linked"))
    }

    /// Refresh the profile fields of an existing Google user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email belongs to someone else.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_google_profile(
        &self,
        id: UserId,
        profile: &GoogleProfile,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.users
             SET email = $2, first_name = $3, last_name = $4, profile_picture = $5,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(profile.email.as_deref())
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(profile.picture.as_deref())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_violation(e, "email already in use"))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Find the reviewer named `username`, creating them if needed.
    ///
    /// First and last name are split from the username. An existing
    /// reviewer's email is replaced when it differs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `email` belongs to another user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn get_or_create_reviewer(
        &self,
        username: &str,
        email: &str,
    ) -> Result<User, RepositoryError> {
        let (first_name, last_name) = split_name(username);
        let sql = format!(
            "INSERT INTO storefront.users (id, username, email, first_name, last_name)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (username) DO UPDATE
                 SET email = EXCLUDED.email,
                     updated_at = CASE
                         WHEN storefront.users.email IS DISTINCT FROM EXCLUDED.email THEN NOW()
                         ELSE storefront.users.updated_at
                     END
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(UserId::generate())
            .bind(username)
            .bind(email)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::unique_violation(e, "A user with that email already exists.")
            })
    }

    /// Get the shared `admin` author, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_admin(&self) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.users (id, username, email, first_name, last_name, is_staff)
             VALUES ($1, $2, 'admin@example.com', 'Admin', 'User', TRUE)
             ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(UserId::generate())
            .bind(ADMIN_USERNAME)
            .fetch_one(self.pool)
            .await?)
    }

    /// Grant or revoke staff rights.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that username.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_staff(&self, username: &str, is_staff: bool) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.users SET is_staff = $2, updated_at = NOW()
             WHERE username = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(is_staff)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
