//! End-to-end tests for the admin unavailability endpoints.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use styliste_backend::notifications::NotificationKind;

use common::{create_test_app, TestApp};

async fn confirmed_booking(app: &mut TestApp, time: &str) -> String {
    let customer = app.customer.clone();
    let admin = app.admin.clone();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/appointments",
            Some(&customer),
            Some(json!({
                "appointment_date": "2024-06-10",
                "appointment_time": time,
                "service_type": "HAIRCUT"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/admin/appointments/{id}/approve"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.next_email().await.kind, NotificationKind::Approved);
    id
}

#[tokio::test]
async fn full_day_block_cancels_then_restores() {
    let mut app = create_test_app();
    let admin = app.admin.clone();
    let customer = app.customer.clone();
    let morning = confirmed_booking(&mut app, "10:00").await;
    let afternoon = confirmed_booking(&mut app, "14:00").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/admin/availability",
            Some(&admin),
            Some(json!({
                "blocked_date": "2024-06-10",
                "is_full_day_blocked": true,
                "reason": "Staff training"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["cancelled_appointments"], 2);
    assert_eq!(body["data"]["created_by_name"], "Salon Admin");
    assert_eq!(body["data"]["blocked_time_start"], json!(null));
    let block_id = body["data"]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let email = app.next_email().await;
        assert_eq!(email.kind, NotificationKind::Unavailability);
        assert_eq!(email.to, "maya@example.com");
        assert!(email.body.contains("Jun 11, 2024 at 10:00 AM"));
    }

    for id in [&morning, &afternoon] {
        let (_, body) = app
            .send(Method::GET, &format!("/api/appointments/{id}"), Some(&customer), None)
            .await;
        assert_eq!(body["data"]["status"], "CANCELLED");
        assert_eq!(body["data"]["cancelled_by"], "ADMIN_UNAVAILABLE");
    }

    let (_, body) = app
        .send(Method::GET, "/api/appointments/available-slots?date=2024-06-10", None, None)
        .await;
    assert_eq!(body["data"]["slots"], json!([]));

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/admin/availability/{block_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["restored_appointments"], 2);
    assert_eq!(body["data"]["blocked_date"], "2024-06-10");

    for _ in 0..2 {
        assert_eq!(app.next_email().await.kind, NotificationKind::Restored);
    }

    for id in [&morning, &afternoon] {
        let (_, body) = app
            .send(Method::GET, &format!("/api/appointments/{id}"), Some(&customer), None)
            .await;
        assert_eq!(body["data"]["status"], "CONFIRMED");
        assert_eq!(body["data"]["cancelled_by"], json!(null));
    }
}

#[tokio::test]
async fn ranged_block_spares_afternoon_booking() {
    let mut app = create_test_app();
    let admin = app.admin.clone();
    let customer = app.customer.clone();
    let afternoon = confirmed_booking(&mut app, "14:00").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/admin/availability",
            Some(&admin),
            Some(json!({
                "blocked_date": "2024-06-10",
                "blocked_time_start": "10:00",
                "blocked_time_end": "12:00",
                "is_full_day_blocked": false
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["cancelled_appointments"], 0);
    assert_eq!(body["data"]["blocked_time_end"], "12:00");

    let (_, body) = app
        .send(Method::GET, &format!("/api/appointments/{afternoon}"), Some(&customer), None)
        .await;
    assert_eq!(body["data"]["status"], "CONFIRMED");

    let (_, body) = app
        .send(Method::GET, "/api/appointments/available-slots?date=2024-06-10", None, None)
        .await;
    assert_eq!(
        body["data"]["slots"],
        json!(["12:00", "15:00", "16:00", "17:00", "18:00"])
    );
}

#[tokio::test]
async fn rejects_blocks_outside_window_or_with_bad_range() {
    let app = create_test_app();
    let admin = app.admin.clone();

    let cases = [
        json!({ "blocked_date": "2024-05-31", "is_full_day_blocked": true }),
        json!({ "blocked_date": "2024-06-17", "is_full_day_blocked": true }),
        json!({
            "blocked_date": "2024-06-10",
            "blocked_time_start": "12:00",
            "blocked_time_end": "10:00",
            "is_full_day_blocked": false
        }),
        json!({
            "blocked_date": "2024-06-10",
            "blocked_time_start": "12:00",
            "is_full_day_blocked": false
        }),
    ];
    for payload in cases {
        let (status, body) = app
            .send(Method::POST, "/api/admin/availability", Some(&admin), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"]["message"], "Validation error");
    }

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admin/availability",
            Some(&admin),
            Some(json!({ "blocked_date": "2024-06-16", "is_full_day_blocked": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn availability_routes_require_admin() {
    let app = create_test_app();
    let customer = app.customer.clone();
    let payload = json!({ "blocked_date": "2024-06-10", "is_full_day_blocked": true });

    let (status, _) = app
        .send(Method::POST, "/api/admin/availability", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::POST, "/api/admin/availability", Some(&customer), Some(payload))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn upcoming_and_by_date_listing() {
    let app = create_test_app();
    let admin = app.admin.clone();

    for date in ["2024-06-03", "2024-06-05"] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/admin/availability",
                Some(&admin),
                Some(json!({ "blocked_date": date, "is_full_day_blocked": true })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(Method::GET, "/api/admin/availability/upcoming", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["blocked_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-06-03", "2024-06-05"]);

    let (_, body) = app
        .send(Method::GET, "/api/admin/availability/date/2024-06-05", Some(&admin), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(Method::GET, "/api/admin/availability/date/not-a-date", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_unknown_block_is_404() {
    let app = create_test_app();
    let admin = app.admin.clone();
    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/admin/availability/{}", uuid::Uuid::now_v7()),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"], "Not found: Unavailability not found");
}
