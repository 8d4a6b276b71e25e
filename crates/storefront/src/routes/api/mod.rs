//! JSON API handlers mounted under `/api`.

pub mod appointments;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod pagination;
pub mod product_images;
pub mod products;
pub mod reviews;
pub mod services;
pub mod validation;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, NON_FIELD_ERRORS};

/// JSON body extractor whose rejections render as 400 validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// URL-encoded form extractor; rejections render like malformed JSON.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct FormBody<T>(pub T);

/// Query extractor whose rejections render as 400 errors.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Path extractor; a segment that does not parse is a 404.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParams<T>(pub T);

/// Parse a JSON body that may be omitted entirely.
///
/// # Errors
///
/// Returns a 400 validation error for malformed JSON.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::field(NON_FIELD_ERRORS, format!("JSON parse error - {e}")))
}

/// `{ "message": ... }` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Distinguish an absent JSON key from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on
/// `Option<Option<T>>` fields.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Parse `true`/`false` query flags the way browsers send them.
pub(crate) fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    #[derive(Debug, Default, serde::Deserialize)]
    struct Body {
        session_id: Option<String>,
    }

    #[test]
    fn test_optional_json_accepts_empty_body() {
        let parsed: Body = optional_json(&Bytes::new()).unwrap();
        assert!(parsed.session_id.is_none());

        let parsed: Body = optional_json(&Bytes::from_static(br#"{"session_id":"abc"}"#))
            .unwrap();
        assert_eq!(parsed.session_id.as_deref(), Some("abc"));

        assert!(optional_json::<Body>(&Bytes::from_static(b"{nope")).is_err());
    }

    #[tokio::test]
    async fn test_form_body_rejection_is_a_validation_error() {
        let request = |content_type: &'static str| {
            axum::http::Request::builder()
                .method("POST")
                .uri("/mail/")
                .header(axum::http::header::CONTENT_TYPE, content_type)
                .body(axum::body::Body::from("session_id=abc"))
                .unwrap()
        };

        let err = FormBody::<Body>::from_request(request("text/plain"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let FormBody(parsed) =
            FormBody::<Body>::from_request(request("application/x-www-form-urlencoded"), &())
                .await
                .unwrap();
        assert_eq!(parsed.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(Some("True")), Some(true));
        assert_eq!(parse_bool(Some("0")), Some(false));
        assert_eq!(parse_bool(Some("maybe")), None);
        assert_eq!(parse_bool(None), None);
    }
}
