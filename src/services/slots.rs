use std::collections::HashSet;
use std::sync::Arc;

use time::{Date, Duration, PrimitiveDateTime, Time};
use tracing::debug;

use crate::config::BookingConfig;
use crate::db::{AdminAvailability, AppointmentRepository, AvailabilityRepository};
use crate::error::AppResult;

/// The ordered set of bookable times within a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCatalog {
    slots: Vec<Time>,
}

impl SlotCatalog {
    pub fn new(mut slots: Vec<Time>) -> Self {
        slots.sort();
        slots.dedup();
        Self { slots }
    }

    pub fn slots(&self) -> &[Time] {
        &self.slots
    }

    pub fn contains(&self, time: Time) -> bool {
        self.slots.binary_search(&time).is_ok()
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::new(BookingConfig::default().slots)
    }
}

/// Catalog slots on one day that no active booking holds and no block covers.
pub fn open_slots(catalog: &SlotCatalog, booked: &[Time], blocks: &[AdminAvailability]) -> Vec<Time> {
    let booked: HashSet<Time> = booked.iter().copied().collect();
    catalog
        .slots()
        .iter()
        .copied()
        .filter(|slot| !booked.contains(slot))
        .filter(|slot| !blocks.iter().any(|block| block.covers(*slot)))
        .collect()
}

/// Answers "which slots are free" from the booking and block stores.
pub struct SlotResolver {
    catalog: SlotCatalog,
    appointments: Arc<dyn AppointmentRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    suggestion_days: i64,
    max_suggestions: usize,
}

impl SlotResolver {
    pub fn new(
        config: &BookingConfig,
        appointments: Arc<dyn AppointmentRepository>,
        availability: Arc<dyn AvailabilityRepository>,
    ) -> Self {
        Self {
            catalog: SlotCatalog::new(config.slots.clone()),
            appointments,
            availability,
            suggestion_days: config.suggestion_days,
            max_suggestions: config.max_suggestions,
        }
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }

    pub async fn available_slots(&self, date: Date) -> AppResult<Vec<Time>> {
        let booked = self.appointments.find_booked_times_by_date(date).await?;
        let blocks = self.availability.find_by_date(date).await?;
        let open = open_slots(&self.catalog, &booked, &blocks);
        debug!(%date, open = open.len(), "Resolved available slots");
        Ok(open)
    }

    /// Open slots on the days following `anchor`, earliest first, capped at
    /// the configured maximum. The anchor day itself is never scanned.
    pub async fn suggest_alternatives(&self, anchor: Date) -> AppResult<Vec<PrimitiveDateTime>> {
        let mut suggestions = Vec::with_capacity(self.max_suggestions);

        for offset in 1..=self.suggestion_days {
            if suggestions.len() >= self.max_suggestions {
                break;
            }
            let Some(day) = anchor.checked_add(Duration::days(offset)) else {
                break;
            };
            for slot in self.available_slots(day).await? {
                if suggestions.len() >= self.max_suggestions {
                    break;
                }
                suggestions.push(PrimitiveDateTime::new(day, slot));
            }
        }

        Ok(suggestions)
    }

    pub async fn is_time_slot_blocked(&self, date: Date, time: Time) -> AppResult<bool> {
        Ok(self.availability.is_time_slot_blocked(date, time).await?)
    }
}
