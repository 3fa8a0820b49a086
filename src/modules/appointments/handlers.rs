use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{
    Appointment, AppointmentStatistics, CreateAppointmentRequest, CreateGuestAppointmentRequest,
    Page, PageRequest, UpdateAppointmentRequest,
};
use crate::error::{AppError, AppResult};
use crate::middleware::{AdminUser, CurrentUser};
use crate::modules::{parse_date, slot_label, ApiResponse};

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct AvailableSlots {
    pub date: String,
    pub slots: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkedAppointments {
    pub linked: u64,
}

pub async fn create_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    let appointment = state
        .appointments
        .create_for_user(user.id, payload, state.today())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Appointment booked successfully", appointment)),
    ))
}

pub async fn create_guest_appointment(
    State(state): State<AppState>,
    Json(payload): Json<CreateGuestAppointmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    let appointment = state
        .appointments
        .create_guest(payload, state.today())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Appointment booked successfully", appointment)),
    ))
}

pub async fn available_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<ApiResponse<AvailableSlots>>> {
    let date = parse_date(&query.date)?;
    let slots = state
        .appointments
        .available_slots(date, state.today())
        .await?;
    Ok(Json(ApiResponse::ok(
        "Available slots retrieved",
        AvailableSlots {
            date: query.date,
            slots: slots.into_iter().map(slot_label).collect(),
        },
    )))
}

pub async fn my_appointments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<ApiResponse<Page<Appointment>>>> {
    let appointments = state.appointments.list_for_user(user.id, page).await?;
    Ok(Json(ApiResponse::ok("Appointments retrieved", appointments)))
}

pub async fn link_guest_appointments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<LinkedAppointments>>> {
    let linked = state.appointments.link_guest_appointments(user.id).await?;
    Ok(Json(ApiResponse::ok(
        "Guest appointments linked",
        LinkedAppointments { linked },
    )))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = state.appointments.get(id).await?;
    if !user.is_admin() && appointment.user_id != Some(user.id) {
        return Err(AppError::Authorization(
            "You can only view your own appointments".into(),
        ));
    }
    Ok(Json(ApiResponse::ok("Appointment retrieved", appointment)))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = state.appointments.cancel(id, &user).await?;
    Ok(Json(ApiResponse::ok("Appointment cancelled", appointment)))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<ApiResponse<Page<Appointment>>>> {
    let appointments = state.appointments.list_all(page).await?;
    Ok(Json(ApiResponse::ok("Appointments retrieved", appointments)))
}

pub async fn appointments_by_date(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(date): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Appointment>>>> {
    let date = parse_date(&date)?;
    let appointments = state.appointments.list_by_date(date).await?;
    Ok(Json(ApiResponse::ok("Appointments retrieved", appointments)))
}

pub async fn statistics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<AppointmentStatistics>>> {
    let stats = state.appointments.statistics().await?;
    Ok(Json(ApiResponse::ok("Statistics retrieved", stats)))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = state.appointments.update(id, payload).await?;
    Ok(Json(ApiResponse::ok("Appointment updated", appointment)))
}

pub async fn approve_appointment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = state.appointments.approve(id).await?;
    Ok(Json(ApiResponse::ok("Appointment approved", appointment)))
}

pub async fn reject_appointment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = state.appointments.reject(id).await?;
    Ok(Json(ApiResponse::ok("Appointment rejected", appointment)))
}
