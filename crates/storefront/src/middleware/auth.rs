//! Authentication extractors.
//!
//! Resolve the caller from an `Authorization: Bearer <access JWT>` header.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
const INVALID_TOKEN: &str = "Given token not valid for any token type";
const NO_PERMISSION: &str = "You do not have permission to perform this action.";

/// Extractor that requires a valid access token for an active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that resolves the caller when possible.
///
/// A missing, malformed or expired token yields `None` rather than a 401.
pub struct OptionalUser(pub Option<User>);

/// Extractor that requires an authenticated staff user.
pub struct RequireStaff(pub User);

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn authenticate(state: &AppState, token: &str) -> Result<User, AppError> {
    let user = AuthService::new(state.pool(), state.tokens())
        .verify_access(token)
        .await
        .map_err(|e| match e {
            AuthError::Repository(err) => AppError::Database(err),
            AuthError::UserNotFound => AppError::Unauthorized("User not found".to_string()),
            _ => AppError::Unauthorized(INVALID_TOKEN.to_string()),
        })?;

    if !user.is_active {
        return Err(AppError::Unauthorized("User is inactive".to_string()));
    }

    set_sentry_user(&user.id, &user.username);
    Ok(user)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| AppError::Unauthorized(NOT_PROVIDED.to_string()))?;
        authenticate(state, token).await.map(Self)
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match authenticate(state, token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(AppError::Database(err)) => Err(AppError::Database(err)),
            Err(_) => Ok(Self(None)),
        }
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AppError::Forbidden(NO_PERMISSION.to_string()));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
