use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime, Time};
use validator::Validate;

use super::formats::{hour_minute, iso_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Pending and confirmed appointments hold their slot.
    pub fn is_active(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            _ => Err(format!("Invalid appointment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Haircut,
    HairColor,
    Styling,
    Makeup,
    Bridal,
    Consultation,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Haircut => "HAIRCUT",
            ServiceType::HairColor => "HAIR_COLOR",
            ServiceType::Styling => "STYLING",
            ServiceType::Makeup => "MAKEUP",
            ServiceType::Bridal => "BRIDAL",
            ServiceType::Consultation => "CONSULTATION",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "HAIRCUT" => Ok(ServiceType::Haircut),
            "HAIR_COLOR" => Ok(ServiceType::HairColor),
            "STYLING" => Ok(ServiceType::Styling),
            "MAKEUP" => Ok(ServiceType::Makeup),
            "BRIDAL" => Ok(ServiceType::Bridal),
            "CONSULTATION" => Ok(ServiceType::Consultation),
            _ => Err(format!("Invalid service type: {}", s)),
        }
    }
}

/// Why an appointment was cancelled. Only `AdminUnavailable` cancellations are
/// ever restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "cancellation_source", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    AdminUnavailable,
    Admin,
    Customer,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    #[serde(with = "iso_date")]
    pub appointment_date: Date,
    #[serde(with = "hour_minute")]
    pub appointment_time: Time,
    pub service_type: ServiceType,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub cancelled_by: Option<CancelledBy>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Appointment {
    pub fn cancel(&mut self, source: CancelledBy) {
        self.status = AppointmentStatus::Cancelled;
        self.cancelled_by = Some(source);
    }
}

/// Row to insert. Contact fields are a snapshot taken at booking time.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: Option<Uuid>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub appointment_date: Date,
    pub appointment_time: Time,
    pub service_type: ServiceType,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    #[serde(with = "iso_date")]
    pub appointment_date: Date,
    #[serde(with = "hour_minute")]
    pub appointment_time: Time,
    #[validate(length(min = 1, message = "Service type is required"))]
    pub service_type: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGuestAppointmentRequest {
    #[validate(length(min = 1, message = "Guest name is required"))]
    pub guest_name: String,
    #[validate(email(message = "Guest email must be a valid address"))]
    pub guest_email: String,
    #[validate(length(min = 1, message = "Guest phone is required"))]
    pub guest_phone: String,
    #[serde(with = "iso_date")]
    pub appointment_date: Date,
    #[serde(with = "hour_minute")]
    pub appointment_time: Time,
    #[validate(length(min = 1, message = "Service type is required"))]
    pub service_type: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    pub status: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentStatistics {
    pub total_appointments: u64,
    pub pending_appointments: u64,
    pub confirmed_appointments: u64,
    pub completed_appointments: u64,
    pub cancelled_appointments: u64,
}
