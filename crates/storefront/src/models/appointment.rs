//! Appointment booking types.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use dental_com_core::{AppointmentId, AppointmentService, AppointmentStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Appointment {
    pub id: AppointmentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub service: AppointmentService,
    pub message: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Format a 10-character phone number as `(xxx) xxx-xxxx`.
///
/// Any other length is returned unchanged.
#[must_use]
pub fn format_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    match chars.as_slice() {
        [a, b, c, d, e, f, g, h, i, j] => {
            format!("({a}{b}{c}) {d}{e}{f}-{g}{h}{i}{j}")
        }
        _ => phone.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub id: AppointmentId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub formatted_phone: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub service: AppointmentService,
    pub service_display: &'static str,
    pub message: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentView {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            first_name: appointment.first_name.clone(),
            last_name: appointment.last_name.clone(),
            full_name: appointment.full_name(),
            email: appointment.email.clone(),
            phone: appointment.phone.clone(),
            formatted_phone: format_phone(&appointment.phone),
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            service: appointment.service,
            service_display: appointment.service.label(),
            message: appointment.message.clone(),
            status: appointment.status,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_ten_digits() {
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
    }

    #[test]
    fn test_format_phone_other_lengths_unchanged() {
        assert_eq!(format_phone("+15551234567"), "+15551234567");
        assert_eq!(format_phone("12345"), "12345");
    }
}
