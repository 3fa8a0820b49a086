//! Admin unavailability blocks.
//!
//! Creating a block cancels the active appointments it covers and tells each
//! customer, with a handful of alternative slots. Deleting a block puts back
//! every appointment on that date that a block had cancelled.

use std::collections::HashMap;
use std::sync::Arc;

use time::{Date, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{
    AdminAvailability, AdminAvailabilityRequest, AdminAvailabilityView, Appointment,
    AppointmentRepository, AppointmentStatus, AvailabilityRepository, BlockWindow, CancelledBy,
    NewAdminAvailability, UnavailabilityCreated, UnavailabilityRemoved, UserDirectory,
};
use crate::error::{AppError, AppResult};
use crate::notifications::{
    Notification, NotificationDispatcher, Recipient, RestoredNotice, UnavailabilityNotice,
};
use crate::services::contact::recipient_for;
use crate::services::slots::SlotResolver;

/// Checks a block request against the booking window and returns its
/// effective range. Nothing is read or written.
pub fn validate_block_request(
    req: &AdminAvailabilityRequest,
    today: Date,
    horizon_days: i64,
) -> AppResult<BlockWindow> {
    if req.blocked_date < today {
        return Err(AppError::Validation("Cannot block dates in the past".into()));
    }
    if req.blocked_date > today + Duration::days(horizon_days) {
        return Err(AppError::Validation(format!(
            "Can only block dates up to {} days in advance",
            horizon_days
        )));
    }

    if req.is_full_day_blocked {
        return Ok(BlockWindow::FullDay);
    }

    match (req.blocked_time_start, req.blocked_time_end) {
        (Some(start), Some(end)) if end > start => Ok(BlockWindow::Range { start, end }),
        (Some(_), Some(_)) => Err(AppError::Validation(
            "End time must be after start time".into(),
        )),
        _ => Err(AppError::Validation(
            "Time range required when not blocking full day".into(),
        )),
    }
}

pub struct AvailabilityService {
    appointments: Arc<dyn AppointmentRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    users: Arc<dyn UserDirectory>,
    resolver: Arc<SlotResolver>,
    notifier: NotificationDispatcher,
    horizon_days: i64,
}

impl AvailabilityService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        users: Arc<dyn UserDirectory>,
        resolver: Arc<SlotResolver>,
        notifier: NotificationDispatcher,
        horizon_days: i64,
    ) -> Self {
        Self {
            appointments,
            availability,
            users,
            resolver,
            notifier,
            horizon_days,
        }
    }

    /// Stores a block, cancels the active appointments it covers and queues
    /// one notice per cancelled appointment once the write has committed.
    pub async fn create_unavailability(
        &self,
        req: AdminAvailabilityRequest,
        admin_id: Uuid,
        today: Date,
    ) -> AppResult<UnavailabilityCreated> {
        req.validate()?;
        let window = validate_block_request(&req, today, self.horizon_days)?;

        let admin = self
            .users
            .find_by_id(admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;

        let date = req.blocked_date;
        let affected: Vec<Appointment> = self
            .appointments
            .find_by_date(date)
            .await?
            .into_iter()
            .filter(|a| a.status.is_active() && window.covers(a.appointment_time))
            .collect();

        // Contacts and suggestions are resolved up front so that nothing
        // fallible runs between the commit and the notices.
        let alternatives = if affected.is_empty() {
            Vec::new()
        } else {
            self.resolver.suggest_alternatives(date).await?
        };
        let mut recipients: HashMap<Uuid, Recipient> = HashMap::with_capacity(affected.len());
        for appointment in &affected {
            recipients.insert(
                appointment.id,
                recipient_for(self.users.as_ref(), appointment).await?,
            );
        }

        let block = NewAdminAvailability {
            blocked_date: date,
            window,
            reason: req.reason,
            created_by: admin_id,
        };
        let ids: Vec<Uuid> = affected.iter().map(|a| a.id).collect();
        let (saved, cancelled) = self
            .availability
            .save_and_cancel(&block, &ids, CancelledBy::AdminUnavailable)
            .await?;

        if cancelled.is_empty() {
            info!(block_id = %saved.id, %date, "Unavailability block created");
        } else {
            warn!(
                block_id = %saved.id,
                %date,
                cancelled = cancelled.len(),
                "Unavailability block cancelled existing appointments"
            );
        }
        if cancelled.len() < ids.len() {
            debug!(
                block_id = %saved.id,
                skipped = ids.len() - cancelled.len(),
                "Appointments changed status before the block was stored"
            );
        }

        for appointment in &cancelled {
            let Some(recipient) = recipients.remove(&appointment.id) else {
                continue;
            };
            self.notifier
                .dispatch(Notification::Unavailability(UnavailabilityNotice {
                    block_id: saved.id,
                    appointment_id: appointment.id,
                    recipient,
                    date,
                    time: appointment.appointment_time,
                    alternatives: alternatives.clone(),
                }));
        }

        Ok(UnavailabilityCreated {
            availability: AdminAvailabilityView::new(saved, Some(admin.name)),
            cancelled_appointments: cancelled.len(),
        })
    }

    /// Deletes a block and confirms again every appointment on its date that
    /// an unavailability block had cancelled.
    pub async fn delete_unavailability(&self, id: Uuid) -> AppResult<UnavailabilityRemoved> {
        let (block, restored) = self
            .availability
            .delete_and_restore(id, AppointmentStatus::Confirmed)
            .await?
            .ok_or_else(|| AppError::NotFound("Unavailability not found".into()))?;

        info!(
            block_id = %block.id,
            date = %block.blocked_date,
            restored = restored.len(),
            "Unavailability block removed"
        );

        for appointment in &restored {
            // The block is already gone; a lookup failure only costs this notice.
            let recipient = match recipient_for(self.users.as_ref(), appointment).await {
                Ok(recipient) => recipient,
                Err(e) => {
                    warn!(
                        appointment_id = %appointment.id,
                        error = %e,
                        "Could not resolve contact for restored appointment"
                    );
                    continue;
                }
            };
            self.notifier.dispatch(Notification::Restored(RestoredNotice {
                block_id: block.id,
                appointment_id: appointment.id,
                recipient,
                date: appointment.appointment_date,
                time: appointment.appointment_time,
                service: appointment.service_type,
            }));
        }

        Ok(UnavailabilityRemoved {
            id: block.id,
            blocked_date: block.blocked_date,
            restored_appointments: restored.len(),
        })
    }

    /// Blocks from today through the end of the blocking horizon.
    pub async fn upcoming_unavailability(&self, today: Date) -> AppResult<Vec<AdminAvailabilityView>> {
        let end = today + Duration::days(self.horizon_days);
        let blocks = self.availability.find_by_date_range(today, end).await?;
        debug!(%today, %end, count = blocks.len(), "Loaded upcoming unavailability");
        self.views(blocks).await
    }

    pub async fn unavailability_for_date(&self, date: Date) -> AppResult<Vec<AdminAvailabilityView>> {
        let blocks = self.availability.find_by_date(date).await?;
        self.views(blocks).await
    }

    /// Drops blocks dated before `today`. Returns how many were removed.
    pub async fn purge_expired(&self, today: Date) -> AppResult<u64> {
        let removed = self.availability.delete_before(today).await?;
        if removed > 0 {
            info!(removed, before = %today, "Purged expired unavailability blocks");
        }
        Ok(removed)
    }

    async fn views(&self, blocks: Vec<AdminAvailability>) -> AppResult<Vec<AdminAvailabilityView>> {
        let mut views = Vec::with_capacity(blocks.len());
        for block in blocks {
            let created_by_name = match block.created_by {
                Some(user_id) => self.users.find_by_id(user_id).await?.map(|u| u.name),
                None => None,
            };
            views.push(AdminAvailabilityView::new(block, created_by_name));
        }
        Ok(views)
    }
}
