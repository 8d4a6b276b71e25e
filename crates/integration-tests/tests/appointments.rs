//! Appointment booking through the JSON API and the contact form.

#![allow(clippy::unwrap_used)]

use chrono::{Days, Utc};
use dental_com_integration_tests::{TestContext, json_with};
use reqwest::StatusCode;
use serde_json::json;

fn future_date() -> String {
    (Utc::now().date_naive() + Days::new(30))
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_book_appointment_via_api() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .post("/api/appointments/")
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": "5551234567",
            "appointment_date": future_date(),
            "appointment_time": "09:30",
            "service": "cleaning",
            "message": "   ",
        }))
        .send()
        .await
        .unwrap();
    let booked = json_with(resp, StatusCode::CREATED).await;
    assert_eq!(booked["full_name"], "Ada Lovelace");
    assert_eq!(booked["status"], "pending");
    assert_eq!(booked["service_display"], "Teeth Cleaning");
    assert_eq!(booked["appointment_time"], "09:30:00");
    assert!(booked["message"].is_null());
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_past_date_and_bad_service_rejected() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .post("/api/appointments/")
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example",
            "phone": "555",
            "appointment_date": "2001-01-01",
            "appointment_time": "09:30",
            "service": "whitening",
        }))
        .send()
        .await
        .unwrap();
    let errors = json_with(resp, StatusCode::BAD_REQUEST).await;
    assert_eq!(
        errors["appointment_date"][0],
        "Appointment date cannot be in the past."
    );
    assert!(errors["service"].is_array());
    assert!(errors["email"].is_array());
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_contact_form_books_appointment() {
    let ctx = TestContext::start().await;
    let date = future_date();

    let resp = ctx
        .post("/mail/")
        .form(&[
            ("first_name", "Grace"),
            ("last_name", "Hopper"),
            ("email", "grace@example.com"),
            ("phone", "5559876543"),
            ("appointment_date", date.as_str()),
            ("appointment_time", "14:00"),
            ("service", "general_checkup"),
            ("message", "First visit."),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Message sent successfully!");

    let resp = ctx.get("/mail/").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
#[ignore = "requires STOREFRONT_TEST_DATABASE_URL"]
async fn test_services_listing_uses_limit_offset() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .get("/api/services/")
        .query(&[("limit", "1")])
        .send()
        .await
        .unwrap();
    let page = json_with(resp, StatusCode::OK).await;
    assert!(page["count"].is_i64());
    assert!(page["results"].as_array().unwrap().len() <= 1);
}
