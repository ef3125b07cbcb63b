use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::auth::verify_gateway_signature;
use crate::handlers::api::{
    cancel_appointment, create_appointment, get_appointment, list_appointments,
    reschedule_appointment, update_appointment_status, AppState,
};
use crate::handlers::catalog::{
    assign_barber_to_service, create_barber, create_service, deactivate_service, get_barber,
    get_barber_availability, get_barber_slots, get_service, list_barbers, list_services,
    remove_barber_from_service, update_barber, update_barber_availability, update_service,
    verify_barber,
};
use crate::handlers::health::health_check;
use crate::handlers::reviews::{create_review, list_barber_reviews, respond_to_review};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));
    router = router.merge(health_route);

    // Service catalog
    let service_routes = Router::new()
        .route("/services", get(list_services).post(create_service))
        .route(
            "/services/:service_id",
            get(get_service)
                .put(update_service)
                .delete(deactivate_service),
        )
        .route(
            "/services/:service_id/barbers/:barber_id",
            post(assign_barber_to_service).delete(remove_barber_from_service),
        );
    router = router.merge(service_routes);

    // Barber profiles and schedules
    let barber_routes = Router::new()
        .route("/barbers", get(list_barbers).post(create_barber))
        .route("/barbers/:barber_id", get(get_barber).put(update_barber))
        .route(
            "/barbers/:barber_id/availability",
            get(get_barber_availability).put(update_barber_availability),
        )
        .route("/barbers/:barber_id/slots", get(get_barber_slots))
        .route("/barbers/:barber_id/verify", put(verify_barber))
        .route("/barbers/:barber_id/reviews", get(list_barber_reviews));
    router = router.merge(barber_routes);

    // Appointment lifecycle
    let appointment_routes = Router::new()
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/appointments/:appointment_id", get(get_appointment))
        .route(
            "/appointments/:appointment_id/status",
            put(update_appointment_status),
        )
        .route(
            "/appointments/:appointment_id/cancel",
            put(cancel_appointment),
        )
        .route(
            "/appointments/:appointment_id/reschedule",
            put(reschedule_appointment),
        )
        .route("/reviews", post(create_review))
        .route("/reviews/:review_id/response", post(respond_to_review));
    router = router.merge(appointment_routes);

    info!(
        "Routes registered, signature verification {}",
        if app_state.gateway_secret.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );

    router
        .layer(middleware::from_fn_with_state(
            Arc::clone(&app_state),
            verify_gateway_signature,
        ))
        .with_state(app_state)
}
