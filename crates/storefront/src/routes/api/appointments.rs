//! Appointment booking API.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use dental_com_core::{AppointmentService, Email};

use super::JsonBody;
use super::validation::{REQUIRED, choice, optional_text, text};
use crate::db::AppointmentRepository;
use crate::db::appointments::AppointmentInput;
use crate::error::{AppError, FieldErrors, Result, add_breadcrumb};
use crate::models::appointment::{Appointment, AppointmentView};
use crate::state::AppState;

const NAME_MAX: usize = 100;
const PHONE_MAX: usize = 20;
const MESSAGE_MAX: usize = 2000;

/// Booking request, accepted as JSON or as a form post.
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

fn parse_date(errors: &mut FieldErrors, raw: Option<String>, today: NaiveDate) -> Option<NaiveDate> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        errors.add("appointment_date", REQUIRED);
        return None;
    };
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) if date < today => {
            errors.add("appointment_date", "Appointment date cannot be in the past.");
            None
        }
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(
                "appointment_date",
                "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
            );
            None
        }
    }
}

fn parse_time(errors: &mut FieldErrors, raw: Option<String>) -> Option<NaiveTime> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        errors.add("appointment_time", REQUIRED);
        return None;
    };
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| {
            errors.add(
                "appointment_time",
                "Time has wrong format. Use one of these formats instead: hh:mm[:ss].",
            );
        })
        .ok()
}

impl AppointmentRequest {
    /// Validate against `today`; past dates are rejected.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every invalid field.
    pub fn validate(self, today: NaiveDate) -> Result<AppointmentInput> {
        let mut errors = FieldErrors::new();
        let first_name = text(&mut errors, "first_name", self.first_name, Some(NAME_MAX), true);
        let last_name = text(&mut errors, "last_name", self.last_name, Some(NAME_MAX), true);
        let email = text(&mut errors, "email", self.email, None, true).and_then(|raw| {
            Email::parse(&raw)
                .map_err(|_| errors.add("email", "Enter a valid email address."))
                .ok()
        });
        let phone = text(&mut errors, "phone", self.phone, Some(PHONE_MAX), true);
        let appointment_date = parse_date(&mut errors, self.appointment_date, today);
        let appointment_time = parse_time(&mut errors, self.appointment_time);
        let service = choice::<AppointmentService>(&mut errors, "service", self.service, true);
        let message = optional_text(&mut errors, "message", self.message, MESSAGE_MAX)
            .filter(|m| !m.is_empty());

        let (
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(phone),
            Some(appointment_date),
            Some(appointment_time),
            Some(service),
        ) = (
            first_name,
            last_name,
            email,
            phone,
            appointment_date,
            appointment_time,
            service,
        )
        else {
            return Err(AppError::Validation(errors));
        };
        errors.into_result()?;

        Ok(AppointmentInput {
            first_name,
            last_name,
            email: email.into_inner(),
            phone,
            appointment_date,
            appointment_time,
            service,
            message,
        })
    }
}

/// Validate and store a booking; shared with the `/mail/` form handler.
///
/// # Errors
///
/// Returns a 400 for invalid input, `AppError::Database` if the insert fails.
pub(crate) async fn book(state: &AppState, request: AppointmentRequest) -> Result<Appointment> {
    let input = request.validate(Utc::now().date_naive())?;
    let appointment = AppointmentRepository::new(state.pool())
        .create(&input)
        .await?;

    info!(
        appointment_id = %appointment.id,
        service = appointment.service.as_str(),
        date = %appointment.appointment_date,
        "Appointment booked"
    );
    add_breadcrumb(
        "appointment",
        "Appointment booked",
        &[("service", appointment.service.as_str())],
    );
    Ok(appointment)
}

/// POST /api/appointments/
///
/// # Errors
///
/// Returns a 400 listing invalid fields.
#[instrument(skip(state, body))]
pub async fn create_appointment(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentView>)> {
    let appointment = book(&state, body).await?;
    Ok((StatusCode::CREATED, Json(AppointmentView::from(&appointment))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn request() -> AppointmentRequest {
        AppointmentRequest {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            phone: Some("5551234567".into()),
            appointment_date: Some("2026-03-12".into()),
            appointment_time: Some("09:30".into()),
            service: Some("cleaning".into()),
            message: Some("  ".into()),
        }
    }

    #[test]
    fn test_valid_booking() {
        let input = request().validate(today()).unwrap();
        assert_eq!(input.first_name, "Ada");
        assert_eq!(input.service, AppointmentService::Cleaning);
        assert_eq!(input.appointment_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(input.message.is_none());
    }

    #[test]
    fn test_today_is_allowed_past_is_not() {
        let mut body = request();
        body.appointment_date = Some("2026-03-10".into());
        assert!(body.validate(today()).is_ok());

        let mut body = request();
        body.appointment_date = Some("2026-03-09".into());
        let Err(AppError::Validation(errors)) = body.validate(today()) else {
            panic!("past date accepted");
        };
        assert_eq!(
            errors.get("appointment_date"),
            Some(&["Appointment date cannot be in the past.".to_string()][..])
        );
    }

    #[test]
    fn test_reports_every_invalid_field() {
        let body = AppointmentRequest {
            email: Some("not-an-email".into()),
            service: Some("whitening".into()),
            ..AppointmentRequest::default()
        };
        let Err(AppError::Validation(errors)) = body.validate(today()) else {
            panic!("invalid booking accepted");
        };
        for field in [
            "first_name",
            "last_name",
            "email",
            "phone",
            "appointment_date",
            "appointment_time",
            "service",
        ] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }
}
