use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime, Time};
use validator::Validate;

use super::formats::{hour_minute, iso_date};

/// An admin-declared block on a single day, either the whole day or the
/// half-open range `[blocked_time_start, blocked_time_end)`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct AdminAvailability {
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub blocked_date: Date,
    #[serde(with = "hour_minute::option")]
    pub blocked_time_start: Option<Time>,
    #[serde(with = "hour_minute::option")]
    pub blocked_time_end: Option<Time>,
    pub is_full_day_blocked: bool,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AdminAvailability {
    pub fn window(&self) -> BlockWindow {
        if self.is_full_day_blocked {
            return BlockWindow::FullDay;
        }
        match (self.blocked_time_start, self.blocked_time_end) {
            (Some(start), Some(end)) => BlockWindow::Range { start, end },
            // Rows written through the service always carry both times.
            _ => BlockWindow::Empty,
        }
    }

    pub fn covers(&self, time: Time) -> bool {
        self.window().covers(time)
    }
}

/// Effective range of a block within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockWindow {
    FullDay,
    Range { start: Time, end: Time },
    Empty,
}

impl BlockWindow {
    pub fn covers(self, time: Time) -> bool {
        match self {
            BlockWindow::FullDay => true,
            BlockWindow::Range { start, end } => start <= time && time < end,
            BlockWindow::Empty => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminAvailabilityRequest {
    #[serde(with = "iso_date")]
    pub blocked_date: Date,
    #[serde(default, with = "hour_minute::option")]
    pub blocked_time_start: Option<Time>,
    #[serde(default, with = "hour_minute::option")]
    pub blocked_time_end: Option<Time>,
    pub is_full_day_blocked: bool,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// A validated block ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdminAvailability {
    pub blocked_date: Date,
    pub window: BlockWindow,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

impl NewAdminAvailability {
    pub fn time_range(&self) -> (Option<Time>, Option<Time>) {
        match self.window {
            BlockWindow::Range { start, end } => (Some(start), Some(end)),
            BlockWindow::FullDay | BlockWindow::Empty => (None, None),
        }
    }

    pub fn is_full_day(&self) -> bool {
        self.window == BlockWindow::FullDay
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminAvailabilityView {
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub blocked_date: Date,
    #[serde(with = "hour_minute::option")]
    pub blocked_time_start: Option<Time>,
    #[serde(with = "hour_minute::option")]
    pub blocked_time_end: Option<Time>,
    pub is_full_day_blocked: bool,
    pub reason: Option<String>,
    pub created_by_name: Option<String>,
}

impl AdminAvailabilityView {
    pub fn new(block: AdminAvailability, created_by_name: Option<String>) -> Self {
        Self {
            id: block.id,
            blocked_date: block.blocked_date,
            blocked_time_start: block.blocked_time_start,
            blocked_time_end: block.blocked_time_end,
            is_full_day_blocked: block.is_full_day_blocked,
            reason: block.reason,
            created_by_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnavailabilityCreated {
    #[serde(flatten)]
    pub availability: AdminAvailabilityView,
    pub cancelled_appointments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnavailabilityRemoved {
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub blocked_date: Date,
    pub restored_appointments: usize,
}
