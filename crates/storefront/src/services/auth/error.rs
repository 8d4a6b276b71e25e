//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from issuing or verifying our own JWTs.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature valid but `exp` is in the past.
    #[error("Token is expired")]
    Expired,

    /// An access token was presented where a refresh token was expected, or vice versa.
    #[error("Token has wrong type")]
    WrongType,

    /// Malformed token, bad signature or missing claims.
    #[error("Token is invalid: {0}")]
    Invalid(String),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(err.to_string()),
        }
    }
}

/// Errors from verifying a Google ID token.
#[derive(Debug, Error)]
pub enum GoogleAuthError {
    /// `GOOGLE_OAUTH_CLIENT_ID` is unset.
    #[error("Google sign-in is not configured")]
    NotConfigured,

    /// The token header has no `kid`.
    #[error("token header has no key id")]
    MissingKeyId,

    /// No Google signing key matches the token's `kid`.
    #[error("unknown signing key {0}")]
    UnknownKey(String),

    /// Fetching Google's signing keys failed.
    #[error("could not fetch Google signing keys: {0}")]
    Jwks(String),

    /// Signature, audience, issuer or expiry check failed.
    #[error("{0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Google(#[from] GoogleAuthError),

    /// Token verified but the user it names is gone.
    #[error("User not found")]
    UserNotFound,

    /// The user exists but was deactivated.
    #[error("User is inactive")]
    InactiveUser,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
