//! Contact form handler.
//!
//! The contact and booking forms post to `/mail/`; a valid submission is
//! stored as a pending appointment.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::api::FormBody;
use super::api::appointments::{AppointmentRequest, book};
use crate::error::Result;
use crate::state::AppState;

/// POST /mail/
///
/// # Errors
///
/// Returns a 400 listing invalid fields.
#[instrument(skip(state, form))]
pub async fn send_mail(
    State(state): State<AppState>,
    FormBody(form): FormBody<AppointmentRequest>,
) -> Result<&'static str> {
    book(&state, form).await?;
    Ok("Message sent successfully!")
}

/// Any other method on `/mail/`.
pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}
