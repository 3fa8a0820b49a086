use serde::Serialize;
use time::macros::format_description;
use time::{Date, Time};

use crate::error::{AppError, AppResult};

pub mod appointments;
pub mod availability;

/// Envelope for every successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Parses a `YYYY-MM-DD` path or query value.
pub(crate) fn parse_date(raw: &str) -> AppResult<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", raw)))
}

pub(crate) fn slot_label(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
