use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, Time};
use uuid::Uuid;

use super::appointment_repository::{cancel_active_with, restore_unavailable_with};
use crate::db::error::DbResult;
use crate::db::models::{
    AdminAvailability, Appointment, AppointmentStatus, CancelledBy, NewAdminAvailability,
};

/// Storage for admin unavailability blocks.
///
/// The two write units touch appointments as well and must be atomic: a block
/// is never stored without its cancellations, nor removed without its
/// restorations.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AdminAvailability>>;

    async fn find_by_date(&self, date: Date) -> DbResult<Vec<AdminAvailability>>;

    /// Blocks with `start <= blocked_date <= end`, ordered by date.
    async fn find_by_date_range(&self, start: Date, end: Date)
        -> DbResult<Vec<AdminAvailability>>;

    async fn is_time_slot_blocked(&self, date: Date, time: Time) -> DbResult<bool>;

    /// Deletes blocks dated strictly before `date`.
    async fn delete_before(&self, date: Date) -> DbResult<u64>;

    /// Stores `block` and, in the same transaction, cancels those of
    /// `cancel_ids` that are still pending or confirmed. Returns the block and
    /// the appointments actually cancelled.
    async fn save_and_cancel(
        &self,
        block: &NewAdminAvailability,
        cancel_ids: &[Uuid],
        cancelled_by: CancelledBy,
    ) -> DbResult<(AdminAvailability, Vec<Appointment>)>;

    /// Deletes a block and restores the appointments it cancelled on its date,
    /// in one transaction. `None` when no block has that id.
    async fn delete_and_restore(
        &self,
        id: Uuid,
        to_status: AppointmentStatus,
    ) -> DbResult<Option<(AdminAvailability, Vec<Appointment>)>>;
}

#[derive(Clone)]
pub struct PgAvailabilityRepository {
    pool: PgPool,
}

impl PgAvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PgAvailabilityRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AdminAvailability>> {
        let row = sqlx::query_as::<_, AdminAvailability>(
            "SELECT * FROM admin_availability WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_date(&self, date: Date) -> DbResult<Vec<AdminAvailability>> {
        let rows = sqlx::query_as::<_, AdminAvailability>(
            r#"
            SELECT * FROM admin_availability
            WHERE blocked_date = $1
            ORDER BY blocked_time_start NULLS FIRST, created_at
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_date_range(
        &self,
        start: Date,
        end: Date,
    ) -> DbResult<Vec<AdminAvailability>> {
        let rows = sqlx::query_as::<_, AdminAvailability>(
            r#"
            SELECT * FROM admin_availability
            WHERE blocked_date BETWEEN $1 AND $2
            ORDER BY blocked_date, blocked_time_start NULLS FIRST
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn is_time_slot_blocked(&self, date: Date, time: Time) -> DbResult<bool> {
        let blocked = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM admin_availability
                WHERE blocked_date = $1
                  AND (is_full_day_blocked
                       OR (blocked_time_start <= $2 AND blocked_time_end > $2))
            )
            "#,
        )
        .bind(date)
        .bind(time)
        .fetch_one(&self.pool)
        .await?;
        Ok(blocked)
    }

    async fn delete_before(&self, date: Date) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM admin_availability WHERE blocked_date < $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn save_and_cancel(
        &self,
        block: &NewAdminAvailability,
        cancel_ids: &[Uuid],
        cancelled_by: CancelledBy,
    ) -> DbResult<(AdminAvailability, Vec<Appointment>)> {
        let (start, end) = block.time_range();
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, AdminAvailability>(
            r#"
            INSERT INTO admin_availability (id, blocked_date, blocked_time_start,
                blocked_time_end, is_full_day_blocked, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(block.blocked_date)
        .bind(start)
        .bind(end)
        .bind(block.is_full_day())
        .bind(&block.reason)
        .bind(block.created_by)
        .fetch_one(&mut *tx)
        .await?;

        let cancelled = cancel_active_with(&mut *tx, cancel_ids, cancelled_by).await?;

        tx.commit().await?;
        Ok((saved, cancelled))
    }

    async fn delete_and_restore(
        &self,
        id: Uuid,
        to_status: AppointmentStatus,
    ) -> DbResult<Option<(AdminAvailability, Vec<Appointment>)>> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, AdminAvailability>(
            "DELETE FROM admin_availability WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(block) = deleted else {
            return Ok(None);
        };

        let restored = restore_unavailable_with(&mut *tx, block.blocked_date, to_status).await?;

        tx.commit().await?;
        Ok(Some((block, restored)))
    }
}
