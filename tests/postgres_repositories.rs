//! Runs the Postgres write units against a real database.
//!
//! Needs `DATABASE_URL` pointing at a server where the test user may create
//! databases: `cargo test -- --ignored`.

use sqlx::PgPool;
use time::macros::{date, time};
use time::{Date, Time};
use uuid::Uuid;

use styliste_backend::db::{
    AppointmentRepository, AppointmentStatus, AvailabilityRepository, BlockWindow, CancelledBy,
    NewAdminAvailability, NewAppointment, PgAppointmentRepository, PgAvailabilityRepository,
    ServiceType,
};

const DAY: Date = date!(2024 - 06 - 10);

async fn seed_admin(pool: &PgPool) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, 'admin')")
        .bind(id)
        .bind("Salon Admin")
        .bind("admin@example.com")
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn book(repo: &PgAppointmentRepository, time: Time, status: AppointmentStatus) -> Uuid {
    let appointment = repo
        .insert(&NewAppointment {
            user_id: None,
            guest_name: "Asha".into(),
            guest_email: format!("guest{}@example.com", time.hour()),
            guest_phone: "555-0100".into(),
            appointment_date: DAY,
            appointment_time: time,
            service_type: ServiceType::Haircut,
            notes: None,
        })
        .await
        .unwrap();
    if status != AppointmentStatus::Pending {
        let tag = (status == AppointmentStatus::Cancelled).then_some(CancelledBy::Customer);
        repo.bulk_set_status(&[appointment.id], status, tag).await.unwrap();
    }
    appointment.id
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn block_cancels_active_rows_and_restores_only_its_own(pool: PgPool) {
    let appointments = PgAppointmentRepository::new(pool.clone());
    let availability = PgAvailabilityRepository::new(pool.clone());
    let admin = seed_admin(&pool).await;

    let pending = book(&appointments, time!(10:00), AppointmentStatus::Pending).await;
    let confirmed = book(&appointments, time!(11:00), AppointmentStatus::Confirmed).await;
    let by_customer = book(&appointments, time!(14:00), AppointmentStatus::Cancelled).await;

    let block = NewAdminAvailability {
        blocked_date: DAY,
        window: BlockWindow::FullDay,
        reason: Some("Training".into()),
        created_by: admin,
    };
    let (saved, cancelled) = availability
        .save_and_cancel(
            &block,
            &[pending, confirmed, by_customer],
            CancelledBy::AdminUnavailable,
        )
        .await
        .unwrap();
    assert!(saved.is_full_day_blocked);
    let mut ids: Vec<Uuid> = cancelled.iter().map(|a| a.id).collect();
    ids.sort();
    let mut expected = vec![pending, confirmed];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(cancelled
        .iter()
        .all(|a| a.cancelled_by == Some(CancelledBy::AdminUnavailable)));

    let untouched = appointments.find_by_id(by_customer).await.unwrap().unwrap();
    assert_eq!(untouched.cancelled_by, Some(CancelledBy::Customer));
    assert!(availability.is_time_slot_blocked(DAY, time!(15:00)).await.unwrap());

    let (deleted, restored) = availability
        .delete_and_restore(saved.id, AppointmentStatus::Confirmed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deleted.id, saved.id);
    assert_eq!(restored.len(), 2);
    assert!(restored
        .iter()
        .all(|a| a.status == AppointmentStatus::Confirmed && a.cancelled_by.is_none()));

    let untouched = appointments.find_by_id(by_customer).await.unwrap().unwrap();
    assert_eq!(untouched.status, AppointmentStatus::Cancelled);
    assert_eq!(untouched.cancelled_by, Some(CancelledBy::Customer));
    assert!(availability.find_by_id(saved.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn restore_for_date_ignores_other_tags(pool: PgPool) {
    let appointments = PgAppointmentRepository::new(pool.clone());
    let blocked = book(&appointments, time!(10:00), AppointmentStatus::Confirmed).await;
    let by_customer = book(&appointments, time!(11:00), AppointmentStatus::Cancelled).await;
    appointments
        .bulk_set_status(
            &[blocked],
            AppointmentStatus::Cancelled,
            Some(CancelledBy::AdminUnavailable),
        )
        .await
        .unwrap();

    let restored = appointments
        .restore_unavailable_for_date(DAY, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].id, blocked);

    let other = appointments.find_by_id(by_customer).await.unwrap().unwrap();
    assert_eq!(other.cancelled_by, Some(CancelledBy::Customer));
}
