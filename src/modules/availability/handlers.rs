use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{
    AdminAvailabilityRequest, AdminAvailabilityView, UnavailabilityCreated, UnavailabilityRemoved,
};
use crate::error::AppResult;
use crate::middleware::AdminUser;
use crate::modules::{parse_date, ApiResponse};

pub async fn create_unavailability(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<AdminAvailabilityRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UnavailabilityCreated>>)> {
    let created = state
        .availability
        .create_unavailability(payload, admin.id, state.today())
        .await?;

    let message = match created.cancelled_appointments {
        0 => "Unavailability created".to_string(),
        n => format!("Unavailability created, {} appointment(s) cancelled", n),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, created))))
}

pub async fn upcoming_unavailability(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<AdminAvailabilityView>>>> {
    let blocks = state
        .availability
        .upcoming_unavailability(state.today())
        .await?;
    Ok(Json(ApiResponse::ok("Upcoming unavailability retrieved", blocks)))
}

pub async fn unavailability_for_date(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(date): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<AdminAvailabilityView>>>> {
    let date = parse_date(&date)?;
    let blocks = state.availability.unavailability_for_date(date).await?;
    Ok(Json(ApiResponse::ok("Unavailability retrieved", blocks)))
}

pub async fn delete_unavailability(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UnavailabilityRemoved>>> {
    let removed = state.availability.delete_unavailability(id).await?;
    Ok(Json(ApiResponse::ok("Unavailability removed", removed)))
}
