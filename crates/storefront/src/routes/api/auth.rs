//! Authentication API.
//!
//! Guest sign-in, Google sign-in, token verification and refresh. Responses
//! use the `{success, message, data | errors}` envelope the frontend expects.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};

use super::{JsonBody, optional_json};
use crate::db::RepositoryError;
use crate::error::{AppError, FieldErrors, Result, add_breadcrumb};
use crate::models::user::UserView;
use crate::services::auth::{AuthError, AuthService, SignIn};
use crate::state::AppState;

const MAX_SESSION_ID_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct GuestLoginRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoogleAuthRequest {
    pub id_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: Option<String>,
}

/// Tokens plus the signed-in user.
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub access: String,
    pub refresh: String,
    pub user: UserView,
}

impl From<SignIn> for AuthData {
    fn from(sign_in: SignIn) -> Self {
        Self {
            user: UserView::from(&sign_in.user),
            access: sign_in.tokens.access,
            refresh: sign_in.tokens.refresh,
        }
    }
}

fn failure(status: StatusCode, message: &str, errors: &FieldErrors) -> Response {
    (
        status,
        axum::Json(json!({ "success": false, "message": message, "errors": errors })),
    )
        .into_response()
}

/// Create or resume a guest user.
///
/// POST /api/auth/guest-login/
///
/// # Errors
///
/// Returns `AppError::Database` if the user cannot be stored.
#[instrument(skip_all)]
pub async fn guest_login(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    const FAILED: &str = "Failed to create guest user";

    let body: GuestLoginRequest = optional_json(&body)?;

    if body
        .session_id
        .as_deref()
        .is_some_and(|s| s.trim().chars().count() > MAX_SESSION_ID_LEN)
    {
        let errors = FieldErrors::single(
            "session_id",
            format!("Ensure this field has no more than {MAX_SESSION_ID_LEN} characters."),
        );
        return Ok(failure(StatusCode::BAD_REQUEST, FAILED, &errors));
    }

    let sign_in = match AuthService::new(state.pool(), state.tokens())
        .guest_login(body.session_id.as_deref())
        .await
    {
        Ok(sign_in) => sign_in,
        Err(AuthError::Repository(RepositoryError::Conflict(msg))) => {
            let errors = FieldErrors::single("session_id", msg);
            return Ok(failure(StatusCode::BAD_REQUEST, FAILED, &errors));
        }
        Err(e) => return Err(internal(e)),
    };

    let (status, message) = if sign_in.created {
        (StatusCode::CREATED, "Guest user created successfully")
    } else {
        (StatusCode::OK, "Guest session resumed")
    };
    add_breadcrumb("auth", message, &[("username", &sign_in.user.username)]);

    Ok((
        status,
        axum::Json(json!({
            "success": true,
            "message": message,
            "data": AuthData::from(sign_in),
        })),
    )
        .into_response())
}

/// Sign in with a Google ID token.
///
/// POST /api/auth/google-auth/
///
/// # Errors
///
/// Returns `AppError::Database` on database failures.
#[instrument(skip_all)]
pub async fn google_auth(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GoogleAuthRequest>,
) -> Result<Response> {
    const FAILED: &str = "Google authentication failed";

    let Some(id_token) = body.id_token.filter(|t| !t.trim().is_empty()) else {
        let errors = FieldErrors::single("id_token", "This field is required.");
        return Ok(failure(StatusCode::BAD_REQUEST, FAILED, &errors));
    };

    let sign_in = match AuthService::new(state.pool(), state.tokens())
        .google_login(state.google(), id_token.trim())
        .await
    {
        Ok(sign_in) => sign_in,
        Err(AuthError::Google(e)) => {
            warn!(error = %e, "Google token rejected");
            let errors = FieldErrors::single("id_token", format!("Invalid Google token: {e}"));
            return Ok(failure(StatusCode::BAD_REQUEST, FAILED, &errors));
        }
        Err(AuthError::Repository(RepositoryError::Conflict(msg))) => {
            let errors = FieldErrors::single("id_token", msg);
            return Ok(failure(StatusCode::BAD_REQUEST, FAILED, &errors));
        }
        Err(e) => return Err(internal(e)),
    };

    add_breadcrumb("auth", "Google sign-in", &[("username", &sign_in.user.username)]);

    Ok((
        StatusCode::OK,
        axum::Json(json!({
            "success": true,
            "message": "Google authentication successful",
            "data": AuthData::from(sign_in),
        })),
    )
        .into_response())
}

/// Check an access token and return its user.
///
/// POST /api/auth/verify-token/
///
/// # Errors
///
/// Returns `AppError::Database` on database failures.
#[instrument(skip_all)]
pub async fn verify_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VerifyTokenRequest>,
) -> Result<Response> {
    let Some(token) = body.token.filter(|t| !t.trim().is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "success": false, "message": "Token is required" })),
        )
            .into_response());
    };

    match AuthService::new(state.pool(), state.tokens())
        .verify_access(token.trim())
        .await
    {
        Ok(user) => Ok((
            StatusCode::OK,
            axum::Json(json!({
                "success": true,
                "message": "Token is valid",
                "data": { "user": UserView::from(&user) },
            })),
        )
            .into_response()),
        Err(AuthError::Token(e)) => Ok((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "success": false,
                "message": "Invalid token",
                "error": e.to_string(),
            })),
        )
            .into_response()),
        Err(AuthError::UserNotFound) => Ok((
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "success": false, "message": "User not found" })),
        )
            .into_response()),
        Err(e) => Err(internal(e)),
    }
}

/// Exchange a refresh token for a new access token.
///
/// POST /api/auth/refresh-token/
///
/// # Errors
///
/// Returns `AppError::Internal` if signing fails.
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RefreshTokenRequest>,
) -> Result<Response> {
    let Some(refresh) = body.refresh.filter(|t| !t.trim().is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "success": false, "message": "Refresh token is required" })),
        )
            .into_response());
    };

    match AuthService::new(state.pool(), state.tokens()).refresh(refresh.trim()) {
        Ok(access) => Ok((
            StatusCode::OK,
            axum::Json(json!({
                "success": true,
                "message": "Token refreshed successfully",
                "data": { "access": access },
            })),
        )
            .into_response()),
        Err(AuthError::Token(e)) => Ok((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "success": false,
                "message": "Invalid refresh token",
                "error": e.to_string(),
            })),
        )
            .into_response()),
        Err(e) => Err(internal(e)),
    }
}

fn internal(err: AuthError) -> AppError {
    match err {
        AuthError::Repository(e) => AppError::Database(e),
        other => AppError::Internal(other.to_string()),
    }
}
