//! In-memory implementation of every repository trait.
//!
//! All tables sit behind one lock, so the multi-table write units
//! (`save_and_cancel`, `delete_and_restore`) are atomic just like their
//! Postgres counterparts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use super::{AppointmentRepository, AvailabilityRepository, UserDirectory};
use crate::db::error::{DatabaseError, DbResult};
use crate::db::models::{
    AdminAvailability, Appointment, AppointmentStatus, CancelledBy, NewAdminAvailability,
    NewAppointment, PageRequest, User,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

#[derive(Default)]
struct MemoryData {
    // UUID v7 keys keep insertion order.
    appointments: BTreeMap<Uuid, Appointment>,
    blocks: BTreeMap<Uuid, AdminAvailability>,
    users: HashMap<Uuid, User>,
}

impl MemoryData {
    fn set_status(&mut self, ids: &[Uuid], status: AppointmentStatus, tag: Option<CancelledBy>) -> u64 {
        let now = OffsetDateTime::now_utc();
        let mut changed = 0;
        for id in ids {
            if let Some(appointment) = self.appointments.get_mut(id) {
                appointment.status = status;
                appointment.cancelled_by = tag;
                appointment.updated_at = now;
                changed += 1;
            }
        }
        changed
    }

    fn cancel_active(&mut self, ids: &[Uuid], tag: CancelledBy) -> Vec<Appointment> {
        let now = OffsetDateTime::now_utc();
        let mut cancelled = Vec::new();
        for id in ids {
            if let Some(appointment) = self.appointments.get_mut(id) {
                if !appointment.status.is_active() {
                    continue;
                }
                appointment.status = AppointmentStatus::Cancelled;
                appointment.cancelled_by = Some(tag);
                appointment.updated_at = now;
                cancelled.push(appointment.clone());
            }
        }
        cancelled
    }

    fn restore_unavailable(&mut self, date: Date, to_status: AppointmentStatus) -> Vec<Appointment> {
        let now = OffsetDateTime::now_utc();
        self.appointments
            .values_mut()
            .filter(|a| {
                a.appointment_date == date
                    && a.status == AppointmentStatus::Cancelled
                    && a.cancelled_by == Some(CancelledBy::AdminUnavailable)
            })
            .map(|a| {
                a.status = to_status;
                a.cancelled_by = None;
                a.updated_at = now;
                a.clone()
            })
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DbResult<RwLockReadGuard<'_, MemoryData>> {
        self.data
            .read()
            .map_err(|_| DatabaseError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> DbResult<RwLockWriteGuard<'_, MemoryData>> {
        self.data
            .write()
            .map_err(|_| DatabaseError::Unavailable("memory store lock poisoned".into()))
    }

    /// Adds or replaces a directory entry.
    pub fn insert_user(&self, user: User) -> DbResult<()> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    pub fn appointment(&self, id: Uuid) -> DbResult<Option<Appointment>> {
        Ok(self.read()?.appointments.get(&id).cloned())
    }
}

fn paged(mut rows: Vec<Appointment>, page: PageRequest) -> (Vec<Appointment>, u64) {
    rows.sort_by_key(|a| (a.appointment_date, a.appointment_time));
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.page_size() as usize)
        .collect();
    (items, total)
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn health_check(&self) -> DbResult<bool> {
        Ok(self.read().is_ok())
    }

    async fn insert(&self, new: &NewAppointment) -> DbResult<Appointment> {
        let now = OffsetDateTime::now_utc();
        let appointment = Appointment {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            guest_name: new.guest_name.clone(),
            guest_email: new.guest_email.clone(),
            guest_phone: new.guest_phone.clone(),
            appointment_date: new.appointment_date,
            appointment_time: new.appointment_time,
            service_type: new.service_type,
            notes: new.notes.clone(),
            status: AppointmentStatus::Pending,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        };
        self.write()?
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Appointment>> {
        self.appointment(id)
    }

    async fn find_by_date(&self, date: Date) -> DbResult<Vec<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .read()?
            .appointments
            .values()
            .filter(|a| a.appointment_date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.appointment_time, a.created_at));
        Ok(rows)
    }

    async fn find_booked_times_by_date(&self, date: Date) -> DbResult<Vec<Time>> {
        Ok(self
            .read()?
            .appointments
            .values()
            .filter(|a| a.appointment_date == date && a.status.is_active())
            .map(|a| a.appointment_time)
            .collect())
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> DbResult<(Vec<Appointment>, u64)> {
        let rows = self
            .read()?
            .appointments
            .values()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect();
        Ok(paged(rows, page))
    }

    async fn find_all(&self, page: PageRequest) -> DbResult<(Vec<Appointment>, u64)> {
        let rows = self.read()?.appointments.values().cloned().collect();
        Ok(paged(rows, page))
    }

    async fn update(&self, appointment: &Appointment) -> DbResult<Appointment> {
        let mut data = self.write()?;
        let stored = data
            .appointments
            .get_mut(&appointment.id)
            .ok_or(DatabaseError::NotFound)?;
        stored.user_id = appointment.user_id;
        stored.status = appointment.status;
        stored.cancelled_by = appointment.cancelled_by;
        stored.notes = appointment.notes.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn bulk_set_status(
        &self,
        ids: &[Uuid],
        status: AppointmentStatus,
        cancelled_by: Option<CancelledBy>,
    ) -> DbResult<u64> {
        Ok(self.write()?.set_status(ids, status, cancelled_by))
    }

    async fn restore_unavailable_for_date(
        &self,
        date: Date,
        to_status: AppointmentStatus,
    ) -> DbResult<Vec<Appointment>> {
        Ok(self.write()?.restore_unavailable(date, to_status))
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(self.read()?.appointments.len() as u64)
    }

    async fn count_by_status(&self, status: AppointmentStatus) -> DbResult<u64> {
        Ok(self
            .read()?
            .appointments
            .values()
            .filter(|a| a.status == status)
            .count() as u64)
    }

    async fn link_guest_email_to_user(&self, email: &str, user_id: Uuid) -> DbResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut data = self.write()?;
        let mut linked = 0;
        for appointment in data.appointments.values_mut() {
            if appointment.user_id.is_none() && appointment.guest_email.eq_ignore_ascii_case(email) {
                appointment.user_id = Some(user_id);
                appointment.updated_at = now;
                linked += 1;
            }
        }
        Ok(linked)
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AdminAvailability>> {
        Ok(self.read()?.blocks.get(&id).cloned())
    }

    async fn find_by_date(&self, date: Date) -> DbResult<Vec<AdminAvailability>> {
        let mut rows: Vec<AdminAvailability> = self
            .read()?
            .blocks
            .values()
            .filter(|b| b.blocked_date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|b| b.blocked_time_start);
        Ok(rows)
    }

    async fn find_by_date_range(
        &self,
        start: Date,
        end: Date,
    ) -> DbResult<Vec<AdminAvailability>> {
        let mut rows: Vec<AdminAvailability> = self
            .read()?
            .blocks
            .values()
            .filter(|b| start <= b.blocked_date && b.blocked_date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|b| (b.blocked_date, b.blocked_time_start));
        Ok(rows)
    }

    async fn is_time_slot_blocked(&self, date: Date, time: Time) -> DbResult<bool> {
        Ok(self
            .read()?
            .blocks
            .values()
            .any(|b| b.blocked_date == date && b.covers(time)))
    }

    async fn delete_before(&self, date: Date) -> DbResult<u64> {
        let mut data = self.write()?;
        let before = data.blocks.len();
        data.blocks.retain(|_, b| b.blocked_date >= date);
        Ok((before - data.blocks.len()) as u64)
    }

    async fn save_and_cancel(
        &self,
        block: &NewAdminAvailability,
        cancel_ids: &[Uuid],
        cancelled_by: CancelledBy,
    ) -> DbResult<(AdminAvailability, Vec<Appointment>)> {
        let (start, end) = block.time_range();
        let saved = AdminAvailability {
            id: Uuid::now_v7(),
            blocked_date: block.blocked_date,
            blocked_time_start: start,
            blocked_time_end: end,
            is_full_day_blocked: block.is_full_day(),
            reason: block.reason.clone(),
            created_by: Some(block.created_by),
            created_at: OffsetDateTime::now_utc(),
        };

        let mut data = self.write()?;
        data.blocks.insert(saved.id, saved.clone());
        let cancelled = data.cancel_active(cancel_ids, cancelled_by);
        Ok((saved, cancelled))
    }

    async fn delete_and_restore(
        &self,
        id: Uuid,
        to_status: AppointmentStatus,
    ) -> DbResult<Option<(AdminAvailability, Vec<Appointment>)>> {
        let mut data = self.write()?;
        let Some(block) = data.blocks.remove(&id) else {
            return Ok(None);
        };
        let restored = data.restore_unavailable(block.blocked_date, to_status);
        Ok(Some((block, restored)))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> DbResult<Option<User>> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }
}
