//! Persistence port for deliveries.
//!
//! Acceptance and every status transition are single store commands: each
//! one runs as one transaction in `PgDeliveryStore`, guarded by a
//! compare-and-set on the row's current status so a concurrent writer loses
//! with `Conflict` instead of overwriting.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::deliveries::lifecycle::DeliveryAction;
use crate::features::deliveries::models::{Delivery, DeliveryStatus};
use crate::features::partners::models::PartnerSnapshot;
use crate::features::recoveries::models::RecoveryReport;

/// A driver taking a report to a chosen partner
#[derive(Debug, Clone, Copy)]
pub struct NewDelivery {
    pub recovery_report_id: Uuid,
    pub driver_id: Uuid,
    pub partner_id: Uuid,
}

/// One step of the delivery state machine, applied only if the delivery is still at `from`
#[derive(Debug, Clone)]
pub struct TransitionCommand {
    pub delivery_id: Uuid,
    pub from: DeliveryStatus,
    pub action: DeliveryAction,
    pub photo_url: Option<String>,
    pub issues: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryFilter {
    pub status: Option<DeliveryStatus>,
    pub driver_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
}

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn find_delivery(&self, id: Uuid) -> Result<Option<Delivery>>;

    async fn find_report(&self, id: Uuid) -> Result<Option<RecoveryReport>>;

    /// The non-cancelled delivery for a report, if any
    async fn find_live_delivery_for_report(&self, report_id: Uuid) -> Result<Option<Delivery>>;

    /// Active partners in registration order, with their delivered counts
    async fn partner_snapshots(&self) -> Result<Vec<PartnerSnapshot>>;

    /// Claim a pending report and insert the `accepted` delivery in one unit.
    ///
    /// `Conflict` if the report is no longer pending or already has a live delivery.
    async fn insert_accepted(&self, new: NewDelivery) -> Result<Delivery>;

    /// Move the delivery and cascade onto its report (and event) in one unit.
    ///
    /// `Conflict` if the delivery is no longer at `cmd.from`.
    async fn apply_transition(&self, cmd: TransitionCommand) -> Result<Delivery>;

    /// Deliveries newest first
    async fn list_deliveries(&self, filter: DeliveryFilter) -> Result<Vec<Delivery>>;
}

/// PostgreSQL-backed delivery store
pub struct PgDeliveryStore {
    pool: PgPool,
}

impl PgDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(operation: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| {
        tracing::error!("Failed to {}: {:?}", operation, e);
        AppError::Database(e)
    }
}

/// The partner can vanish between ranking and insert; the live-delivery
/// index is the only unique constraint on `deliveries`
fn insert_delivery_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Unavailable("The selected partner is no longer available".to_string())
        }
        _ => AppError::from_constraint(e, "Delivery already exists for this recovery report"),
    }
}

#[async_trait]
impl DeliveryStore for PgDeliveryStore {
    async fn find_delivery(&self, id: Uuid) -> Result<Option<Delivery>> {
        let sql = format!("SELECT {} FROM deliveries WHERE id = $1", Delivery::COLUMNS);

        sqlx::query_as::<_, Delivery>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get delivery"))
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<RecoveryReport>> {
        let sql = format!(
            "SELECT {} FROM recovery_reports WHERE id = $1",
            RecoveryReport::COLUMNS
        );

        sqlx::query_as::<_, RecoveryReport>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get recovery report"))
    }

    async fn find_live_delivery_for_report(&self, report_id: Uuid) -> Result<Option<Delivery>> {
        let sql = format!(
            "SELECT {} FROM deliveries WHERE recovery_report_id = $1 AND status <> 'cancelled'",
            Delivery::COLUMNS
        );

        sqlx::query_as::<_, Delivery>(&sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get live delivery"))
    }

    async fn partner_snapshots(&self) -> Result<Vec<PartnerSnapshot>> {
        sqlx::query_as::<_, PartnerSnapshot>(
            r#"
            SELECT
                p.id,
                p.active,
                p.current_need_level AS need_level,
                COUNT(d.id) FILTER (WHERE d.status = 'delivered') AS delivered_count
            FROM partners p
            LEFT JOIN deliveries d ON d.partner_id = p.id
            WHERE p.active
            GROUP BY p.id
            ORDER BY p.created_at, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("load partner snapshots"))
    }

    async fn insert_accepted(&self, new: NewDelivery) -> Result<Delivery> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;

        let claimed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE recovery_reports
            SET status = 'assigned', updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND has_food
            RETURNING id
            "#,
        )
        .bind(new.recovery_report_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("claim recovery report"))?;

        if claimed.is_none() {
            return Err(AppError::Conflict(
                "This recovery is no longer available".to_string(),
            ));
        }

        let sql = format!(
            r#"
            INSERT INTO deliveries (recovery_report_id, driver_id, partner_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            Delivery::COLUMNS
        );

        let delivery = sqlx::query_as::<_, Delivery>(&sql)
            .bind(new.recovery_report_id)
            .bind(new.driver_id)
            .bind(new.partner_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(insert_delivery_error)?;

        tx.commit().await.map_err(db_error("commit delivery"))?;

        Ok(delivery)
    }

    async fn apply_transition(&self, cmd: TransitionCommand) -> Result<Delivery> {
        let target = cmd.action.target();
        let cascade = cmd.action.cascade();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;

        let sql = format!(
            r#"
            UPDATE deliveries
            SET status = $3,
                pickup_time = CASE WHEN $3 = 'picked_up'::delivery_status THEN NOW() ELSE pickup_time END,
                pickup_photo_url = CASE WHEN $3 = 'picked_up'::delivery_status
                    THEN COALESCE($4, pickup_photo_url) ELSE pickup_photo_url END,
                delivery_time = CASE WHEN $3 = 'delivered'::delivery_status THEN NOW() ELSE delivery_time END,
                delivery_photo_url = CASE WHEN $3 = 'delivered'::delivery_status
                    THEN COALESCE($4, delivery_photo_url) ELSE delivery_photo_url END,
                issues = COALESCE($5, issues),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            Delivery::COLUMNS
        );

        let delivery = sqlx::query_as::<_, Delivery>(&sql)
            .bind(cmd.delivery_id)
            .bind(cmd.from)
            .bind(target)
            .bind(&cmd.photo_url)
            .bind(&cmd.issues)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("update delivery status"))?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Delivery {} is no longer {}",
                    cmd.delivery_id, cmd.from
                ))
            })?;

        let event_id: Uuid = sqlx::query_scalar(
            r#"
            UPDATE recovery_reports
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING event_id
            "#,
        )
        .bind(delivery.recovery_report_id)
        .bind(cascade.report_status)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("cascade recovery report status"))?;

        if let Some(event_status) = cascade.event_status {
            sqlx::query("UPDATE events SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(event_id)
                .bind(event_status)
                .execute(&mut *tx)
                .await
                .map_err(db_error("cascade event status"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("commit delivery transition"))?;

        Ok(delivery)
    }

    async fn list_deliveries(&self, filter: DeliveryFilter) -> Result<Vec<Delivery>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM deliveries
            WHERE ($1::delivery_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR driver_id = $2)
              AND ($3::uuid IS NULL OR partner_id = $3)
            ORDER BY created_at DESC
            "#,
            Delivery::COLUMNS
        );

        sqlx::query_as::<_, Delivery>(&sql)
            .bind(filter.status)
            .bind(filter.driver_id)
            .bind(filter.partner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list deliveries"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::db_violation;
    use sqlx::error::ErrorKind;

    #[test]
    fn test_vanished_partner_is_unavailable() {
        let err = insert_delivery_error(db_violation(
            ErrorKind::ForeignKeyViolation,
            Some("deliveries_partner_id_fkey"),
        ));
        assert!(matches!(err, AppError::Unavailable(m) if m.contains("partner")));
    }

    #[test]
    fn test_second_live_delivery_is_conflict() {
        let err = insert_delivery_error(db_violation(
            ErrorKind::UniqueViolation,
            Some("idx_deliveries_live_report"),
        ));
        assert!(matches!(err, AppError::Conflict(m) if m.contains("already exists")));
    }
}
