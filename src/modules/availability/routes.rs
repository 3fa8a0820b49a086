use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    create_unavailability, delete_unavailability, unavailability_for_date, upcoming_unavailability,
};
use crate::app_state::AppState;

/// Admin unavailability routes, mounted under `/api/admin/availability`.
pub fn availability_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_unavailability))
        .route("/upcoming", get(upcoming_unavailability))
        .route("/date/{date}", get(unavailability_for_date))
        .route("/{id}", delete(delete_unavailability))
}
