use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::models::appointment::AppointmentEventKind;
use crate::models::requests::ErrorResponse;
use crate::tests::common::fixtures::{
    as_actor, as_signed_actor, seed_catalog, setup_test_app, signed_headers, with_headers,
};

/// API handler tests
#[cfg(test)]
mod api_tests {
    use super::*;

    fn booking_body(date: &str, start: &str) -> Value {
        json!({
            "barber_id": "barber-1",
            "service_id": "svc-cut",
            "date": date,
            "start_time": start,
            "customer_notes": "Short on the sides"
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = setup_test_app(None);

        let response = app.server.get("/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn test_missing_actor_headers_is_unauthorized() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let response = app
            .server
            .post("/appointments")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error.kind, "Unauthenticated");
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let app = setup_test_app(None);

        let response = as_actor(app.server.get("/appointments"), "someone", "janitor").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_book_appointment() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let response = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["status"], "pending");
        assert_eq!(body["start_time"], "10:00");
        assert_eq!(body["end_time"], "10:45");
        assert_eq!(body["price_cents"], 2500);
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["customer_id"], "customer-1");
        assert_eq!(body["customer_notes"], "Short on the sides");

        assert_eq!(app.events.kinds(), vec![AppointmentEventKind::Booked]);
    }

    #[tokio::test]
    async fn test_only_customers_book() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let response = as_actor(app.server.post("/appointments"), "user-barber-1", "barber")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert!(app.events.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_booking_rejections_map_to_status_codes() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let cases = [
            ("2035-04-02", "17:45", StatusCode::BAD_REQUEST, "OutsideWorkingHours"),
            ("2035-04-08", "10:00", StatusCode::BAD_REQUEST, "OutsideWorkingHours"),
            ("2020-04-06", "10:00", StatusCode::BAD_REQUEST, "PastDateRejected"),
        ];

        for (date, start, status, kind) in cases {
            let response = as_actor(app.server.post("/appointments"), "customer-1", "customer")
                .json(&booking_body(date, start))
                .await;

            assert_eq!(response.status_code(), status, "{} {}", date, start);
            let body: ErrorResponse = response.json();
            assert_eq!(body.error.kind, kind);
        }
    }

    #[tokio::test]
    async fn test_unknown_barber_is_unavailable() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let mut body = booking_body("2035-04-02", "10:00");
        body["barber_id"] = json!("nobody");

        let response = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&body)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.error.kind, "ProviderUnavailable");
        assert_eq!(error.error.message, "Barber not available");
    }

    #[tokio::test]
    async fn test_overlapping_booking_conflicts() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let first = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;
        assert_eq!(first.status_code(), StatusCode::CREATED);

        let second = as_actor(app.server.post("/appointments"), "customer-2", "customer")
            .json(&booking_body("2035-04-02", "10:30"))
            .await;

        assert_eq!(second.status_code(), StatusCode::CONFLICT);
        let body: ErrorResponse = second.json();
        assert_eq!(body.error.kind, "SlotConflict");
        assert_eq!(body.error.message, "Time slot is already booked");
    }

    #[tokio::test]
    async fn test_availability_excludes_booked_slots() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;

        let response = app
            .server
            .get("/barbers/barber-1/availability")
            .add_query_param("date", "2035-04-02")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["is_available"], true);
        let slots = body["available_slots"].as_array().unwrap();
        assert_eq!(slots.len(), 16);
        assert!(!slots
            .iter()
            .any(|slot| slot["start_time"] == "10:00" || slot["start_time"] == "10:30"));
    }

    #[tokio::test]
    async fn test_availability_on_day_off() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let response = app
            .server
            .get("/barbers/barber-1/availability")
            .add_query_param("date", "2035-04-08")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["is_available"], false);
        assert_eq!(body["message"], "Barber is not available on this day");
        assert_eq!(body["available_slots"], json!([]));
    }

    #[tokio::test]
    async fn test_availability_for_unknown_barber() {
        let app = setup_test_app(None);

        let response = app
            .server
            .get("/barbers/nobody/availability")
            .add_query_param("date", "2035-04-02")
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_slot_grid_uses_requested_granularity() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let response = app
            .server
            .get("/barbers/barber-1/slots")
            .add_query_param("date", "2035-04-02")
            .add_query_param("slot_minutes", 60)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["slots"].as_array().unwrap().len(), 9);
        assert_eq!(body["working_hours"]["start_time"], "09:00");

        let invalid = app
            .server
            .get("/barbers/barber-1/slots")
            .add_query_param("date", "2035-04-02")
            .add_query_param("slot_minutes", 0)
            .await;
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_customer_sees_only_own_appointments() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        for (customer, start) in [("customer-1", "09:00"), ("customer-2", "11:00")] {
            let response = as_actor(app.server.post("/appointments"), customer, "customer")
                .json(&booking_body("2035-04-02", start))
                .await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
        }

        let mine: Value = as_actor(app.server.get("/appointments"), "customer-1", "customer")
            .await
            .json();
        assert_eq!(mine["pagination"]["total"], 1);
        assert_eq!(mine["appointments"][0]["customer_id"], "customer-1");

        let barber: Value = as_actor(app.server.get("/appointments"), "user-barber-1", "barber")
            .await
            .json();
        assert_eq!(barber["pagination"]["total"], 2);

        let paged: Value = as_actor(
            app.server
                .get("/appointments")
                .add_query_param("page", 2)
                .add_query_param("page_size", 1),
            "admin-1",
            "admin",
        )
        .await
        .json();
        assert_eq!(paged["pagination"]["pages"], 2);
        assert_eq!(paged["appointments"][0]["start_time"], "11:00");
    }

    #[tokio::test]
    async fn test_stranger_cannot_read_appointment() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let booked: Value = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "10:00"))
            .await
            .json();
        let path = format!("/appointments/{}", booked["id"].as_str().unwrap());

        let stranger = as_actor(app.server.get(&path), "customer-2", "customer").await;
        assert_eq!(stranger.status_code(), StatusCode::FORBIDDEN);

        let owner = as_actor(app.server.get(&path), "customer-1", "customer").await;
        assert_eq!(owner.status_code(), StatusCode::OK);

        let missing = as_actor(app.server.get("/appointments/nope"), "admin-1", "admin").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signed_headers_are_verified() {
        let secret = "gateway-secret";
        let app = setup_test_app(Some(secret));
        seed_catalog(&app.database);

        let unsigned = as_actor(app.server.get("/appointments"), "admin-1", "admin").await;
        assert_eq!(unsigned.status_code(), StatusCode::UNAUTHORIZED);

        let signed = as_signed_actor(
            app.server.get("/appointments").add_query_param("page", 1),
            secret,
            "GET",
            "/appointments?page=1",
            "admin-1",
            "admin",
        )
        .await;
        assert_eq!(signed.status_code(), StatusCode::OK);

        let wrong_key = as_signed_actor(
            app.server.get("/appointments").add_query_param("page", 1),
            "not-the-secret",
            "GET",
            "/appointments?page=1",
            "admin-1",
            "admin",
        )
        .await;
        assert_eq!(wrong_key.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_manages_catalog() {
        let app = setup_test_app(None);

        let forbidden = as_actor(app.server.post("/services"), "customer-1", "customer")
            .json(&json!({
                "name": "Beard Trim",
                "description": "Shape and line-up",
                "duration_minutes": 20,
                "price_cents": 1500
            }))
            .await;
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let too_short = as_actor(app.server.post("/services"), "admin-1", "admin")
            .json(&json!({
                "name": "Blink",
                "description": "",
                "duration_minutes": 5,
                "price_cents": 100
            }))
            .await;
        assert_eq!(too_short.status_code(), StatusCode::BAD_REQUEST);

        let created = as_actor(app.server.post("/services"), "admin-1", "admin")
            .json(&json!({
                "name": "Beard Trim",
                "description": "Shape and line-up",
                "duration_minutes": 20,
                "price_cents": 1500,
                "currency": "EUR"
            }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let service: Value = created.json();
        assert_eq!(service["currency"], "EUR");

        let listed: Value = app.server.get("/services").await.json();
        assert_eq!(listed["services"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_barber_profile_lifecycle() {
        let app = setup_test_app(None);

        let created = as_actor(app.server.post("/barbers"), "user-7", "barber")
            .json(&json!({ "display_name": "Sam", "bio": "Classic cuts" }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let profile: Value = created.json();
        let barber_id = profile["id"].as_str().unwrap().to_string();
        assert_eq!(profile["is_verified"], false);
        assert_eq!(profile["availability"]["sunday"]["is_available"], false);

        let duplicate = as_actor(app.server.post("/barbers"), "user-7", "barber")
            .json(&json!({ "display_name": "Sam again" }))
            .await;
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

        // Unverified barbers are not listed
        let listed: Value = app.server.get("/barbers").await.json();
        assert_eq!(listed.as_array().unwrap().len(), 0);

        let verified = as_actor(
            app.server.put(&format!("/barbers/{}/verify", barber_id)),
            "admin-1",
            "admin",
        )
        .json(&json!({ "is_verified": true }))
        .await;
        assert_eq!(verified.status_code(), StatusCode::OK);

        let listed: Value = app.server.get("/barbers").await.json();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let updated = as_actor(
            app.server.put(&format!("/barbers/{}/availability", barber_id)),
            "user-7",
            "barber",
        )
        .json(&json!({
            "sunday": { "is_available": true, "start_time": "10:00", "end_time": "14:00" }
        }))
        .await;
        assert_eq!(updated.status_code(), StatusCode::OK);
        let profile: Value = updated.json();
        assert_eq!(profile["availability"]["sunday"]["is_available"], true);
        assert_eq!(profile["availability"]["sunday"]["end_time"], "14:00");
        assert_eq!(profile["availability"]["monday"]["start_time"], "09:00");

        let other_barber = as_actor(
            app.server.put(&format!("/barbers/{}/availability", barber_id)),
            "user-8",
            "barber",
        )
        .json(&json!({
            "monday": { "is_available": false, "start_time": "09:00", "end_time": "18:00" }
        }))
        .await;
        assert_eq!(other_barber.status_code(), StatusCode::FORBIDDEN);

        let bad_window = as_actor(
            app.server.put(&format!("/barbers/{}/availability", barber_id)),
            "user-7",
            "barber",
        )
        .json(&json!({
            "monday": { "is_available": true, "start_time": "18:00", "end_time": "09:00" }
        }))
        .await;
        assert!(bad_window.status_code().is_client_error());

        let bad_day = as_actor(
            app.server.put(&format!("/barbers/{}/availability", barber_id)),
            "user-7",
            "barber",
        )
        .json(&json!({
            "funday": { "is_available": true, "start_time": "09:00", "end_time": "18:00" }
        }))
        .await;
        assert_eq!(bad_day.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cancellation_reason_is_limited() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let booked: Value = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "14:00"))
            .await
            .json();
        let path = format!("/appointments/{}/cancel", booked["id"].as_str().unwrap());

        let too_long = as_actor(app.server.put(&path), "customer-1", "customer")
            .json(&json!({ "reason": "x".repeat(201) }))
            .await;
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = too_long.json();
        assert_eq!(error.error.kind, "Validation");

        let status_path = format!("/appointments/{}/status", booked["id"].as_str().unwrap());
        let via_status = as_actor(app.server.put(&status_path), "user-barber-1", "barber")
            .json(&json!({ "status": "cancelled", "cancellation_reason": "y".repeat(201) }))
            .await;
        assert_eq!(via_status.status_code(), StatusCode::BAD_REQUEST);

        let at_limit = as_actor(app.server.put(&path), "customer-1", "customer")
            .json(&json!({ "reason": "x".repeat(200) }))
            .await;
        assert_eq!(at_limit.status_code(), StatusCode::OK);
        let body: Value = at_limit.json();
        assert_eq!(body["cancellation_reason"].as_str().unwrap().len(), 200);
    }

    #[tokio::test]
    async fn test_signed_body_is_verified_and_not_replayable() {
        let secret = "gateway-secret";
        let app = setup_test_app(Some(secret));
        seed_catalog(&app.database);

        // Public reads need no signature
        let services = app.server.get("/services").await;
        assert_eq!(services.status_code(), StatusCode::OK);

        let body = booking_body("2035-04-02", "10:00");
        let signed_over = serde_json::to_string(&body).unwrap();

        let mut swapped = body.clone();
        swapped["start_time"] = json!("15:00");
        let tampered_headers = signed_headers(
            secret,
            "POST",
            "/appointments",
            &signed_over,
            "customer-1",
            "customer",
        );
        let tampered = with_headers(app.server.post("/appointments"), &tampered_headers)
            .json(&swapped)
            .await;
        assert_eq!(tampered.status_code(), StatusCode::UNAUTHORIZED);

        let headers = signed_headers(
            secret,
            "POST",
            "/appointments",
            &signed_over,
            "customer-1",
            "customer",
        );
        let accepted = with_headers(app.server.post("/appointments"), &headers)
            .json(&body)
            .await;
        assert_eq!(accepted.status_code(), StatusCode::CREATED);

        let replayed = with_headers(app.server.post("/appointments"), &headers)
            .json(&body)
            .await;
        assert_eq!(replayed.status_code(), StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = replayed.json();
        assert_eq!(error.error.message, "Authentication error: Nonce already used");

        assert_eq!(app.events.kinds(), vec![AppointmentEventKind::Booked]);
    }

    #[tokio::test]
    async fn test_admin_edits_and_deactivates_service() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let forbidden = as_actor(app.server.put("/services/svc-cut"), "customer-1", "customer")
            .json(&json!({ "price_cents": 1 }))
            .await;
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let bad_duration = as_actor(app.server.put("/services/svc-cut"), "admin-1", "admin")
            .json(&json!({ "duration_minutes": 301 }))
            .await;
        assert_eq!(bad_duration.status_code(), StatusCode::BAD_REQUEST);

        let missing = as_actor(app.server.put("/services/nope"), "admin-1", "admin")
            .json(&json!({ "price_cents": 1 }))
            .await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let edited = as_actor(app.server.put("/services/svc-cut"), "admin-1", "admin")
            .json(&json!({ "name": "Skin Fade", "price_cents": 3000, "currency": "GBP" }))
            .await;
        assert_eq!(edited.status_code(), StatusCode::OK);
        let service: Value = edited.json();
        assert_eq!(service["name"], "Skin Fade");
        assert_eq!(service["price_cents"], 3000);
        assert_eq!(service["currency"], "GBP");
        assert_eq!(service["duration_minutes"], 45);

        let deactivated = as_actor(app.server.delete("/services/svc-cut"), "admin-1", "admin").await;
        assert_eq!(deactivated.status_code(), StatusCode::OK);
        let service: Value = deactivated.json();
        assert_eq!(service["is_active"], false);

        let listed: Value = app.server.get("/services").await.json();
        assert_eq!(listed["services"], json!([]));

        let booking = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;
        assert_eq!(booking.status_code(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = booking.json();
        assert_eq!(error.error.kind, "ServiceUnavailable");
    }

    #[tokio::test]
    async fn test_barber_removed_from_service() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let forbidden = as_actor(
            app.server.delete("/services/svc-cut/barbers/barber-1"),
            "user-barber-1",
            "barber",
        )
        .await;
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let removed = as_actor(
            app.server.delete("/services/svc-cut/barbers/barber-1"),
            "admin-1",
            "admin",
        )
        .await;
        assert_eq!(removed.status_code(), StatusCode::OK);
        let service: Value = removed.json();
        assert_eq!(service["provider_ids"], json!([]));

        let profile: Value = app.server.get("/barbers/barber-1").await.json();
        assert_eq!(profile["service_ids"], json!([]));

        let booking = as_actor(app.server.post("/appointments"), "customer-1", "customer")
            .json(&booking_body("2035-04-02", "10:00"))
            .await;
        assert_eq!(booking.status_code(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = booking.json();
        assert_eq!(error.error.kind, "ServiceNotOffered");
    }

    #[tokio::test]
    async fn test_barber_edits_own_profile() {
        let app = setup_test_app(None);
        seed_catalog(&app.database);

        let edited = as_actor(app.server.put("/barbers/barber-1"), "user-barber-1", "barber")
            .json(&json!({ "display_name": "Alex", "bio": "Fades and tapers" }))
            .await;
        assert_eq!(edited.status_code(), StatusCode::OK);
        let profile: Value = edited.json();
        assert_eq!(profile["display_name"], "Alex");
        assert_eq!(profile["bio"], "Fades and tapers");

        let cleared = as_actor(app.server.put("/barbers/barber-1"), "admin-1", "admin")
            .json(&json!({ "bio": "" }))
            .await;
        assert_eq!(cleared.status_code(), StatusCode::OK);
        let profile: Value = cleared.json();
        assert_eq!(profile["bio"], Value::Null);
        assert_eq!(profile["display_name"], "Alex");

        let blank_name = as_actor(app.server.put("/barbers/barber-1"), "user-barber-1", "barber")
            .json(&json!({ "display_name": "  " }))
            .await;
        assert_eq!(blank_name.status_code(), StatusCode::BAD_REQUEST);

        let stranger = as_actor(app.server.put("/barbers/barber-1"), "user-9", "barber")
            .json(&json!({ "display_name": "Mallory" }))
            .await;
        assert_eq!(stranger.status_code(), StatusCode::FORBIDDEN);

        let missing = as_actor(app.server.put("/barbers/nobody"), "admin-1", "admin")
            .json(&json!({ "display_name": "Ghost" }))
            .await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
