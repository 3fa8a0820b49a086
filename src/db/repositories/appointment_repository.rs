use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use time::{Date, Time};
use uuid::Uuid;

use crate::db::error::{DatabaseError, DbResult};
use crate::db::models::{
    Appointment, AppointmentStatus, CancelledBy, NewAppointment, PageRequest,
};

/// Appointment storage.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn health_check(&self) -> DbResult<bool>;

    async fn insert(&self, appointment: &NewAppointment) -> DbResult<Appointment>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Appointment>>;

    /// All appointments on a date, any status, ordered by time.
    async fn find_by_date(&self, date: Date) -> DbResult<Vec<Appointment>>;

    /// Times held by pending or confirmed appointments on a date.
    async fn find_booked_times_by_date(&self, date: Date) -> DbResult<Vec<Time>>;

    /// A user's appointments ordered by date then time, with the total count.
    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> DbResult<(Vec<Appointment>, u64)>;

    async fn find_all(&self, page: PageRequest) -> DbResult<(Vec<Appointment>, u64)>;

    /// Writes back the mutable fields (user link, status, cancellation tag, notes).
    async fn update(&self, appointment: &Appointment) -> DbResult<Appointment>;

    /// Sets status and cancellation tag on every listed appointment in one statement.
    async fn bulk_set_status(
        &self,
        ids: &[Uuid],
        status: AppointmentStatus,
        cancelled_by: Option<CancelledBy>,
    ) -> DbResult<u64>;

    /// Moves a date's `CANCELLED` + `ADMIN_UNAVAILABLE` appointments to `to_status`,
    /// clears their tag and returns the rows it changed.
    async fn restore_unavailable_for_date(
        &self,
        date: Date,
        to_status: AppointmentStatus,
    ) -> DbResult<Vec<Appointment>>;

    async fn count(&self) -> DbResult<u64>;

    async fn count_by_status(&self, status: AppointmentStatus) -> DbResult<u64>;

    /// Attaches unlinked guest bookings made with `email` to `user_id`.
    async fn link_guest_email_to_user(&self, email: &str, user_id: Uuid) -> DbResult<u64>;
}

#[derive(Clone)]
pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn health_check(&self) -> DbResult<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }

    async fn insert(&self, appointment: &NewAppointment) -> DbResult<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (id, user_id, guest_name, guest_email, guest_phone,
                appointment_date, appointment_time, service_type, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(appointment.user_id)
        .bind(&appointment.guest_name)
        .bind(&appointment.guest_email)
        .bind(&appointment.guest_phone)
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(appointment.service_type)
        .bind(&appointment.notes)
        .bind(AppointmentStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Appointment>> {
        let row = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_date(&self, date: Date) -> DbResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE appointment_date = $1
            ORDER BY appointment_time, created_at
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_booked_times_by_date(&self, date: Date) -> DbResult<Vec<Time>> {
        let times = sqlx::query_scalar::<_, Time>(
            r#"
            SELECT appointment_time FROM appointments
            WHERE appointment_date = $1
              AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(times)
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> DbResult<(Vec<Appointment>, u64)> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE user_id = $1
            ORDER BY appointment_date, appointment_time
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(page.page_size()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM appointments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total as u64))
    }

    async fn find_all(&self, page: PageRequest) -> DbResult<(Vec<Appointment>, u64)> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            ORDER BY appointment_date, appointment_time
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.page_size()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        Ok((rows, total))
    }

    async fn update(&self, appointment: &Appointment) -> DbResult<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET user_id = $1,
                status = $2,
                cancelled_by = $3,
                notes = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(appointment.user_id)
        .bind(appointment.status)
        .bind(appointment.cancelled_by)
        .bind(&appointment.notes)
        .bind(appointment.id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(DatabaseError::NotFound)
    }

    async fn bulk_set_status(
        &self,
        ids: &[Uuid],
        status: AppointmentStatus,
        cancelled_by: Option<CancelledBy>,
    ) -> DbResult<u64> {
        bulk_set_status_with(&self.pool, ids, status, cancelled_by).await
    }

    async fn restore_unavailable_for_date(
        &self,
        date: Date,
        to_status: AppointmentStatus,
    ) -> DbResult<Vec<Appointment>> {
        restore_unavailable_with(&self.pool, date, to_status).await
    }

    async fn count(&self) -> DbResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn count_by_status(&self, status: AppointmentStatus) -> DbResult<u64> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(total as u64)
    }

    async fn link_guest_email_to_user(&self, email: &str, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET user_id = $1, updated_at = NOW()
            WHERE lower(guest_email) = lower($2) AND user_id IS NULL
            "#,
        )
        .bind(user_id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

async fn bulk_set_status_with<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
    status: AppointmentStatus,
    cancelled_by: Option<CancelledBy>,
) -> DbResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET status = $1, cancelled_by = $2, updated_at = NOW()
        WHERE id = ANY($3)
        "#,
    )
    .bind(status)
    .bind(cancelled_by)
    .bind(ids)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Cancels the listed appointments that are still pending or confirmed and
/// returns the rows it changed. Rows cancelled or completed in the meantime
/// keep their status and tag.
pub(crate) async fn cancel_active_with<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
    cancelled_by: CancelledBy,
) -> DbResult<Vec<Appointment>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments
        SET status = $1, cancelled_by = $2, updated_at = NOW()
        WHERE id = ANY($3)
          AND status IN ($4, $5)
        RETURNING *
        "#,
    )
    .bind(AppointmentStatus::Cancelled)
    .bind(cancelled_by)
    .bind(ids)
    .bind(AppointmentStatus::Pending)
    .bind(AppointmentStatus::Confirmed)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

pub(crate) async fn restore_unavailable_with<'e, E: PgExecutor<'e>>(
    executor: E,
    date: Date,
    to_status: AppointmentStatus,
) -> DbResult<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments
        SET status = $1, cancelled_by = NULL, updated_at = NOW()
        WHERE appointment_date = $2
          AND status = $3
          AND cancelled_by = $4
        RETURNING *
        "#,
    )
    .bind(to_status)
    .bind(date)
    .bind(AppointmentStatus::Cancelled)
    .bind(CancelledBy::AdminUnavailable)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}
