use std::sync::Arc;

use time::{Date, Time};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{
    Appointment, AppointmentRepository, AppointmentStatistics, AppointmentStatus, CancelledBy,
    CreateAppointmentRequest, CreateGuestAppointmentRequest, NewAppointment, Page, PageRequest,
    ServiceType, UpdateAppointmentRequest, User, UserDirectory,
};
use crate::error::{AppError, AppResult};
use crate::notifications::{DecisionNotice, Notification, NotificationDispatcher};
use crate::services::contact::recipient_for;
use crate::services::slots::SlotResolver;

pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    users: Arc<dyn UserDirectory>,
    resolver: Arc<SlotResolver>,
    notifier: NotificationDispatcher,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        users: Arc<dyn UserDirectory>,
        resolver: Arc<SlotResolver>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            appointments,
            users,
            resolver,
            notifier,
        }
    }

    pub async fn health_check(&self) -> AppResult<bool> {
        Ok(self.appointments.health_check().await?)
    }

    /// Books on behalf of a signed-in user, snapshotting their contact details.
    pub async fn create_for_user(
        &self,
        user_id: Uuid,
        req: CreateAppointmentRequest,
        today: Date,
    ) -> AppResult<Appointment> {
        req.validate()?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with ID: {}", user_id)))?;

        let service_type = parse_service_type(&req.service_type)?;
        self.ensure_bookable(req.appointment_date, req.appointment_time, today)
            .await?;

        let appointment = self
            .appointments
            .insert(&NewAppointment {
                user_id: Some(user.id),
                guest_name: user.name,
                guest_email: user.email,
                guest_phone: user.phone.unwrap_or_default(),
                appointment_date: req.appointment_date,
                appointment_time: req.appointment_time,
                service_type,
                notes: req.notes,
            })
            .await?;

        info!(
            appointment_id = %appointment.id,
            %user_id,
            date = %appointment.appointment_date,
            "Appointment booked"
        );
        Ok(appointment)
    }

    pub async fn create_guest(
        &self,
        req: CreateGuestAppointmentRequest,
        today: Date,
    ) -> AppResult<Appointment> {
        req.validate()?;
        let service_type = parse_service_type(&req.service_type)?;
        self.ensure_bookable(req.appointment_date, req.appointment_time, today)
            .await?;

        let appointment = self
            .appointments
            .insert(&NewAppointment {
                user_id: None,
                guest_name: req.guest_name.trim().to_string(),
                guest_email: req.guest_email.trim().to_string(),
                guest_phone: req.guest_phone.trim().to_string(),
                appointment_date: req.appointment_date,
                appointment_time: req.appointment_time,
                service_type,
                notes: req.notes,
            })
            .await?;

        info!(
            appointment_id = %appointment.id,
            date = %appointment.appointment_date,
            "Guest appointment booked"
        );
        Ok(appointment)
    }

    pub async fn approve(&self, id: Uuid) -> AppResult<Appointment> {
        let mut appointment = self.pending(id, "approved").await?;
        appointment.status = AppointmentStatus::Confirmed;
        let appointment = self.appointments.update(&appointment).await?;

        info!(appointment_id = %id, "Appointment approved");
        if let Some(notice) = self.decision_notice(&appointment).await {
            self.notifier.dispatch(Notification::Approved(notice));
        }
        Ok(appointment)
    }

    pub async fn reject(&self, id: Uuid) -> AppResult<Appointment> {
        let mut appointment = self.pending(id, "rejected").await?;
        appointment.cancel(CancelledBy::Admin);
        let appointment = self.appointments.update(&appointment).await?;

        info!(appointment_id = %id, "Appointment rejected");
        if let Some(notice) = self.decision_notice(&appointment).await {
            self.notifier.dispatch(Notification::Rejected(notice));
        }
        Ok(appointment)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Appointment> {
        self.appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment not found with ID: {}", id)))
    }

    pub async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> AppResult<Page<Appointment>> {
        let (items, total) = self.appointments.find_by_user(user_id, page).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn list_all(&self, page: PageRequest) -> AppResult<Page<Appointment>> {
        let (items, total) = self.appointments.find_all(page).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn list_by_date(&self, date: Date) -> AppResult<Vec<Appointment>> {
        Ok(self.appointments.find_by_date(date).await?)
    }

    /// Admin edit of status and notes. No notification is sent.
    pub async fn update(&self, id: Uuid, req: UpdateAppointmentRequest) -> AppResult<Appointment> {
        req.validate()?;
        let mut appointment = self.get(id).await?;

        if let Some(raw) = req.status.as_deref() {
            let status: AppointmentStatus = raw.parse().map_err(AppError::Validation)?;
            if status != appointment.status {
                appointment.status = status;
                appointment.cancelled_by = match status {
                    AppointmentStatus::Cancelled => Some(CancelledBy::Admin),
                    _ => None,
                };
            }
        }
        if req.notes.is_some() {
            appointment.notes = req.notes;
        }

        let appointment = self.appointments.update(&appointment).await?;
        debug!(appointment_id = %id, status = %appointment.status, "Appointment updated");
        Ok(appointment)
    }

    /// Cancellation by the customer who owns the booking.
    pub async fn cancel(&self, id: Uuid, caller: &User) -> AppResult<Appointment> {
        let mut appointment = self.get(id).await?;
        if appointment.user_id != Some(caller.id) {
            return Err(AppError::Authorization(
                "You can only cancel your own appointments".into(),
            ));
        }
        if !appointment.status.is_active() {
            return Err(AppError::Validation(
                "Only pending or confirmed appointments can be cancelled".into(),
            ));
        }

        appointment.cancel(CancelledBy::Customer);
        let appointment = self.appointments.update(&appointment).await?;
        info!(appointment_id = %id, user_id = %caller.id, "Appointment cancelled by customer");
        Ok(appointment)
    }

    pub async fn statistics(&self) -> AppResult<AppointmentStatistics> {
        Ok(AppointmentStatistics {
            total_appointments: self.appointments.count().await?,
            pending_appointments: self
                .appointments
                .count_by_status(AppointmentStatus::Pending)
                .await?,
            confirmed_appointments: self
                .appointments
                .count_by_status(AppointmentStatus::Confirmed)
                .await?,
            completed_appointments: self
                .appointments
                .count_by_status(AppointmentStatus::Completed)
                .await?,
            cancelled_appointments: self
                .appointments
                .count_by_status(AppointmentStatus::Cancelled)
                .await?,
        })
    }

    pub async fn available_slots(&self, date: Date, today: Date) -> AppResult<Vec<Time>> {
        if date < today {
            return Ok(Vec::new());
        }
        self.resolver.available_slots(date).await
    }

    /// Attaches earlier guest bookings made with the user's email to their account.
    pub async fn link_guest_appointments(&self, user_id: Uuid) -> AppResult<u64> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with ID: {}", user_id)))?;

        let linked = self
            .appointments
            .link_guest_email_to_user(&user.email, user.id)
            .await?;
        if linked > 0 {
            info!(%user_id, linked, "Linked guest appointments to account");
        }
        Ok(linked)
    }

    async fn ensure_bookable(&self, date: Date, time: Time, today: Date) -> AppResult<()> {
        if date < today {
            return Err(AppError::Validation(
                "Appointment date cannot be in the past".into(),
            ));
        }
        if !self.resolver.catalog().contains(time) {
            return Err(AppError::Validation(format!(
                "{:02}:{:02} is not a bookable time slot",
                time.hour(),
                time.minute()
            )));
        }
        if self.resolver.is_time_slot_blocked(date, time).await? {
            return Err(AppError::Conflict(
                "The salon is unavailable at the selected time".into(),
            ));
        }
        let booked = self.appointments.find_booked_times_by_date(date).await?;
        if booked.contains(&time) {
            return Err(AppError::Conflict(
                "The selected time slot is already booked".into(),
            ));
        }
        Ok(())
    }

    async fn pending(&self, id: Uuid, action: &str) -> AppResult<Appointment> {
        let appointment = self
            .appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;
        if appointment.status != AppointmentStatus::Pending {
            return Err(AppError::Validation(format!(
                "Only pending appointments can be {}",
                action
            )));
        }
        Ok(appointment)
    }

    /// The decision has already been stored, so a failed contact lookup only
    /// costs the notice.
    async fn decision_notice(&self, appointment: &Appointment) -> Option<DecisionNotice> {
        let recipient = match recipient_for(self.users.as_ref(), appointment).await {
            Ok(recipient) => recipient,
            Err(e) => {
                warn!(
                    appointment_id = %appointment.id,
                    error = %e,
                    "Could not resolve contact for decision notice"
                );
                return None;
            }
        };
        Some(DecisionNotice {
            appointment_id: appointment.id,
            recipient,
            date: appointment.appointment_date,
            time: appointment.appointment_time,
            service: appointment.service_type,
        })
    }
}

fn parse_service_type(raw: &str) -> AppResult<ServiceType> {
    raw.parse().map_err(AppError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookingConfig;
    use crate::db::{
        AvailabilityRepository, BlockWindow, MemoryStore, NewAdminAvailability, UserRole,
    };
    use crate::db::{DatabaseError, DbResult};
    use crate::notifications::{ChannelMailer, NotificationKind, OutgoingEmail};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use time::macros::{date, datetime, time};
    use tokio::sync::mpsc::UnboundedReceiver;

    const TODAY: Date = date!(2024 - 06 - 01);
    const DAY: Date = date!(2024 - 06 - 10);

    fn setup() -> (MemoryStore, AppointmentService, UnboundedReceiver<OutgoingEmail>) {
        let store = MemoryStore::new();
        let resolver = Arc::new(SlotResolver::new(
            &BookingConfig::default(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        ));
        let (mailer, outbox) = ChannelMailer::new();
        let service = AppointmentService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            resolver,
            NotificationDispatcher::new(Arc::new(mailer), "salon@example.com"),
        );
        (store, service, outbox)
    }

    fn customer(store: &MemoryStore, email: &str) -> User {
        let user = User {
            id: Uuid::now_v7(),
            name: "Maya Rao".into(),
            email: email.into(),
            phone: Some("555-0199".into()),
            role: UserRole::Customer,
            created_at: datetime!(2024-01-01 00:00 UTC),
        };
        store.insert_user(user.clone()).unwrap();
        user
    }

    fn request(date: Date, time: Time, service: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            appointment_date: date,
            appointment_time: time,
            service_type: service.into(),
            notes: None,
        }
    }

    fn guest(email: &str, time: Time) -> CreateGuestAppointmentRequest {
        CreateGuestAppointmentRequest {
            guest_name: "Asha".into(),
            guest_email: email.into(),
            guest_phone: "555-0100".into(),
            appointment_date: DAY,
            appointment_time: time,
            service_type: "haircut".into(),
            notes: Some("Short please".into()),
        }
    }

    #[tokio::test]
    async fn booking_snapshots_user_contact() {
        let (store, service, _outbox) = setup();
        let user = customer(&store, "maya@example.com");

        let appointment = service
            .create_for_user(user.id, request(DAY, time!(10:00), "hair_color"), TODAY)
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.user_id, Some(user.id));
        assert_eq!(appointment.guest_email, "maya@example.com");
        assert_eq!(appointment.guest_phone, "555-0199");
        assert_eq!(appointment.service_type, ServiceType::HairColor);
    }

    #[tokio::test]
    async fn booking_rejects_bad_input() {
        let (store, service, _outbox) = setup();
        let user = customer(&store, "maya@example.com");

        let past = service
            .create_for_user(user.id, request(date!(2024 - 05 - 31), time!(10:00), "haircut"), TODAY)
            .await;
        assert!(matches!(past, Err(AppError::Validation(_))));

        let bad_service = service
            .create_for_user(user.id, request(DAY, time!(10:00), "massage"), TODAY)
            .await;
        assert!(matches!(bad_service, Err(AppError::Validation(_))));

        let off_catalog = service
            .create_for_user(user.id, request(DAY, time!(13:00), "haircut"), TODAY)
            .await;
        assert!(matches!(off_catalog, Err(AppError::Validation(_))));

        let unknown = service
            .create_for_user(Uuid::now_v7(), request(DAY, time!(10:00), "haircut"), TODAY)
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn taken_or_blocked_slot_is_a_conflict() {
        let (store, service, _outbox) = setup();
        service.create_guest(guest("a@example.com", time!(10:00)), TODAY).await.unwrap();

        let taken = service.create_guest(guest("b@example.com", time!(10:00)), TODAY).await;
        assert!(matches!(taken, Err(AppError::Conflict(_))));

        store
            .save_and_cancel(
                &NewAdminAvailability {
                    blocked_date: DAY,
                    window: BlockWindow::Range { start: time!(14:00), end: time!(16:00) },
                    reason: None,
                    created_by: Uuid::nil(),
                },
                &[],
                CancelledBy::AdminUnavailable,
            )
            .await
            .unwrap();
        let blocked = service.create_guest(guest("b@example.com", time!(15:00)), TODAY).await;
        assert!(matches!(blocked, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn guest_booking_requires_valid_email() {
        let (_store, service, _outbox) = setup();
        let result = service.create_guest(guest("not-an-email", time!(10:00)), TODAY).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn approve_and_reject_only_from_pending() {
        let (_store, service, mut outbox) = setup();
        let first = service.create_guest(guest("a@example.com", time!(10:00)), TODAY).await.unwrap();
        let second = service.create_guest(guest("b@example.com", time!(11:00)), TODAY).await.unwrap();

        let approved = service.approve(first.id).await.unwrap();
        assert_eq!(approved.status, AppointmentStatus::Confirmed);
        let email = outbox.recv().await.unwrap();
        assert_eq!(email.kind, NotificationKind::Approved);
        assert_eq!(email.to, "a@example.com");

        assert!(matches!(service.approve(first.id).await, Err(AppError::Validation(_))));
        assert!(matches!(service.reject(first.id).await, Err(AppError::Validation(_))));

        let rejected = service.reject(second.id).await.unwrap();
        assert_eq!(rejected.status, AppointmentStatus::Cancelled);
        assert_eq!(rejected.cancelled_by, Some(CancelledBy::Admin));
        let email = outbox.recv().await.unwrap();
        assert_eq!(email.kind, NotificationKind::Rejected);

        assert!(matches!(service.approve(Uuid::now_v7()).await, Err(AppError::NotFound(_))));
    }

    /// Directory that starts failing once `down` is set.
    struct FlakyDirectory {
        store: MemoryStore,
        down: AtomicBool,
    }

    #[async_trait]
    impl UserDirectory for FlakyDirectory {
        async fn find_by_id(&self, user_id: Uuid) -> DbResult<Option<User>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(DatabaseError::Unavailable("directory offline".into()));
            }
            UserDirectory::find_by_id(&self.store, user_id).await
        }
    }

    #[tokio::test]
    async fn decision_stands_when_contact_lookup_fails() {
        let store = MemoryStore::new();
        let resolver = Arc::new(SlotResolver::new(
            &BookingConfig::default(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        ));
        let directory = Arc::new(FlakyDirectory {
            store: store.clone(),
            down: AtomicBool::new(false),
        });
        let (mailer, mut outbox) = ChannelMailer::new();
        let service = AppointmentService::new(
            Arc::new(store.clone()),
            directory.clone(),
            resolver,
            NotificationDispatcher::new(Arc::new(mailer), "salon@example.com"),
        );
        let user = customer(&store, "maya@example.com");
        let first = service
            .create_for_user(user.id, request(DAY, time!(10:00), "haircut"), TODAY)
            .await
            .unwrap();
        let second = service
            .create_for_user(user.id, request(DAY, time!(11:00), "styling"), TODAY)
            .await
            .unwrap();

        directory.down.store(true, Ordering::SeqCst);

        let approved = service.approve(first.id).await.unwrap();
        assert_eq!(approved.status, AppointmentStatus::Confirmed);
        let rejected = service.reject(second.id).await.unwrap();
        assert_eq!(rejected.status, AppointmentStatus::Cancelled);

        assert_eq!(
            store.appointment(first.id).unwrap().unwrap().status,
            AppointmentStatus::Confirmed
        );
        tokio::task::yield_now().await;
        assert!(outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn customer_can_cancel_only_own_booking() {
        let (store, service, _outbox) = setup();
        let owner = customer(&store, "maya@example.com");
        let stranger = customer(&store, "other@example.com");
        let appointment = service
            .create_for_user(owner.id, request(DAY, time!(10:00), "styling"), TODAY)
            .await
            .unwrap();

        let denied = service.cancel(appointment.id, &stranger).await;
        assert!(matches!(denied, Err(AppError::Authorization(_))));

        let cancelled = service.cancel(appointment.id, &owner).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Customer));

        let again = service.cancel(appointment.id, &owner).await;
        assert!(matches!(again, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_parses_status_and_keeps_notes() {
        let (_store, service, _outbox) = setup();
        let appointment = service.create_guest(guest("a@example.com", time!(10:00)), TODAY).await.unwrap();

        let updated = service
            .update(
                appointment.id,
                UpdateAppointmentRequest { status: Some("completed".into()), notes: None },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Completed);
        assert_eq!(updated.notes.as_deref(), Some("Short please"));

        let bad = service
            .update(
                appointment.id,
                UpdateAppointmentRequest { status: Some("lost".into()), notes: None },
            )
            .await;
        assert!(matches!(bad, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn statistics_count_by_status() {
        let (_store, service, _outbox) = setup();
        let a = service.create_guest(guest("a@example.com", time!(10:00)), TODAY).await.unwrap();
        let b = service.create_guest(guest("b@example.com", time!(11:00)), TODAY).await.unwrap();
        service.create_guest(guest("c@example.com", time!(12:00)), TODAY).await.unwrap();
        service.approve(a.id).await.unwrap();
        service.reject(b.id).await.unwrap();

        let stats = service.statistics().await.unwrap();
        assert_eq!(
            stats,
            AppointmentStatistics {
                total_appointments: 3,
                pending_appointments: 1,
                confirmed_appointments: 1,
                completed_appointments: 0,
                cancelled_appointments: 1,
            }
        );
    }

    #[tokio::test]
    async fn guest_bookings_link_to_new_account() {
        let (store, service, _outbox) = setup();
        service.create_guest(guest("Maya@Example.com", time!(10:00)), TODAY).await.unwrap();
        service.create_guest(guest("someone@example.com", time!(11:00)), TODAY).await.unwrap();
        let user = customer(&store, "maya@example.com");

        assert_eq!(service.link_guest_appointments(user.id).await.unwrap(), 1);
        let mine = service.list_for_user(user.id, PageRequest::default()).await.unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].appointment_time, time!(10:00));

        assert_eq!(service.link_guest_appointments(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn past_dates_have_no_open_slots() {
        let (_store, service, _outbox) = setup();
        assert!(service
            .available_slots(date!(2024 - 05 - 31), TODAY)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(service.available_slots(DAY, TODAY).await.unwrap().len(), 8);
    }
}
