use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    appointments_by_date, approve_appointment, available_slots, cancel_appointment,
    create_appointment, create_guest_appointment, get_appointment, link_guest_appointments,
    list_appointments, my_appointments, reject_appointment, statistics, update_appointment,
};
use crate::app_state::AppState;

/// Customer-facing booking routes, mounted under `/api/appointments`.
pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_appointment))
        .route("/guest", post(create_guest_appointment))
        .route("/available-slots", get(available_slots))
        .route("/mine", get(my_appointments))
        .route("/link-guest", post(link_guest_appointments))
        .route("/{id}", get(get_appointment).delete(cancel_appointment))
}

/// Admin booking management, mounted under `/api/admin/appointments`.
pub fn admin_appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments))
        .route("/statistics", get(statistics))
        .route("/date/{date}", get(appointments_by_date))
        .route("/{id}", put(update_appointment))
        .route("/{id}/approve", post(approve_appointment))
        .route("/{id}/reject", post(reject_appointment))
}
