use axum::{extract::State, middleware, routing::get, Json, Router};
use serde_json::json;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;

use crate::{
    app_state::AppState,
    middleware::tracing::observability_middleware,
    modules::{
        appointments::routes::{admin_appointment_routes, appointment_routes},
        availability::routes::availability_routes,
    },
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/appointments", appointment_routes())
        .nest("/api/admin/appointments", admin_appointment_routes())
        .nest("/api/admin/availability", availability_routes())
        .layer(middleware::from_fn(observability_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_status = match state.appointments.health_check().await {
        Ok(true) => "healthy",
        Ok(false) => "unhealthy",
        Err(e) => {
            tracing::info!("Database health check failed: {}", e);
            "unhealthy"
        }
    };

    let telemetry_health = crate::telemetry::telemetry_health_check();
    let timestamp = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "telemetry": telemetry_health
        }
    }))
}
