//! Appointment repository.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;

use dental_com_core::AppointmentService;

use super::RepositoryError;
use crate::models::appointment::Appointment;

/// Validated booking request.
#[derive(Debug, Clone)]
pub struct AppointmentInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub service: AppointmentService,
    pub message: Option<String>,
}

/// Repository for appointment database operations.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a booking request with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &AppointmentInput) -> Result<Appointment, RepositoryError> {
        Ok(sqlx::query_as::<_, Appointment>(
            "INSERT INTO storefront.appointments
                 (first_name, last_name, email, phone, appointment_date, appointment_time,
                  service, message)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, first_name, last_name, email, phone, appointment_date,
                       appointment_time, service, message, status, created_at, updated_at",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.appointment_date)
        .bind(input.appointment_time)
        .bind(input.service)
        .bind(input.message.as_deref())
        .fetch_one(self.pool)
        .await?)
    }
}
