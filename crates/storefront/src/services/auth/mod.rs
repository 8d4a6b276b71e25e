//! Authentication service.
//!
//! Guest sign-in keyed by a browser session id, Google sign-in keyed by the
//! Google subject id, and JWT access/refresh handling for both.

mod error;
pub mod google;
pub mod tokens;

pub use error::{AuthError, GoogleAuthError, TokenError};
pub use google::{GoogleClaims, GoogleVerifier};
pub use tokens::{Claims, TokenPair, TokenService, TokenType};

use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::users::{GoogleProfile, UserRepository};
use crate::models::user::User;

/// Number of session/subject characters used in generated usernames.
const USERNAME_PREFIX_LEN: usize = 8;

/// Outcome of a successful sign-in.
#[derive(Debug)]
pub struct SignIn {
    pub user: User,
    pub tokens: TokenPair,
    /// `true` when the account was created by this sign-in.
    pub created: bool,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Sign in as the guest bound to `session_id`, creating it on first use.
    ///
    /// A blank or missing session id gets a fresh UUID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on database errors.
    #[instrument(skip(self))]
    pub async fn guest_login(&self, session_id: Option<&str>) -> Result<SignIn, AuthError> {
        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

        if let Some(user) = self.users.get_by_guest_session(&session_id).await? {
            let tokens = self.tokens.issue_pair(user.id)?;
            return Ok(SignIn {
                user,
                tokens,
                created: false,
            });
        }

        let mut username = format!("guest_{}", prefix(&session_id));
        if self.users.username_exists(&username).await? {
            username = format!("guest_{}", Uuid::new_v4().simple());
        }

        let user = self.users.create_guest(&session_id, &username).await?;
        info!(user_id = %user.id, username = %user.username, "Guest user created");

        let tokens = self.tokens.issue_pair(user.id)?;
        Ok(SignIn {
            user,
            tokens,
            created: true,
        })
    }

    /// Sign in with a verified Google ID token.
    ///
    /// Existing users have their email, names and picture refreshed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Google` if the token fails verification.
    /// Returns `AuthError::Repository` on database errors.
    #[instrument(skip_all)]
    pub async fn google_login(
        &self,
        verifier: &GoogleVerifier,
        id_token: &str,
    ) -> Result<SignIn, AuthError> {
        let claims = verifier.verify(id_token).await?;
        let profile = GoogleProfile {
            google_id: claims.sub.clone(),
            email: claims.email.clone().filter(|e| !e.is_empty()),
            first_name: claims.given_name.clone(),
            last_name: claims.family_name.clone(),
            picture: claims.picture.clone(),
        };

        let (user, created) = match self.users.get_by_google_id(&claims.sub).await? {
            Some(existing) => (
                self.users.update_google_profile(existing.id, &profile).await?,
                false,
            ),
            None => {
                let fallback = format!("google_{}", prefix(&claims.sub));
                let mut username = profile
                    .email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map_or_else(|| fallback.clone(), str::to_owned);
                if self.users.username_exists(&username).await? {
                    username = fallback;
                }
                let user = self.users.create_google(&username, &profile).await?;
                info!(user_id = %user.id, username = %user.username, "Google user created");
                (user, true)
            }
        };

        let tokens = self.tokens.issue_pair(user.id)?;
        Ok(SignIn {
            user,
            tokens,
            created,
        })
    }

    /// Resolve the user named by a valid access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for bad tokens and `AuthError::UserNotFound`
    /// when the user no longer exists.
    pub async fn verify_access(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token, TokenType::Access)?;
        self.users
            .get_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the refresh token is invalid or expired.
    pub fn refresh(&self, refresh: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify(refresh, TokenType::Refresh)?;
        Ok(self.tokens.issue(claims.user_id, TokenType::Access)?)
    }
}

fn prefix(value: &str) -> String {
    value.chars().take(USERNAME_PREFIX_LEN).collect()
}
