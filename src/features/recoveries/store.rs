//! Persistence port for recovery reports.
//!
//! Filing a report touches two rows (the report and its event) and must land
//! as a unit, so the write is a single store command rather than two service
//! calls. `PgRecoveryStore` runs it in one transaction.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::events::models::Event;
use crate::features::recoveries::models::{CreateRecoveryReport, RecoveryReport, RecoveryStatus};

/// Filters for listing reports
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFilter {
    pub status: Option<RecoveryStatus>,
    pub has_food: Option<bool>,
}

/// Content fields a reporter may revise after filing
#[derive(Debug, Clone, Default)]
pub struct ReportContentUpdate {
    pub has_food: Option<bool>,
    pub food_quantity: Option<String>,
    pub food_description: Option<String>,
    pub notes: Option<String>,
    pub photo_urls: Option<Vec<String>>,
}

#[async_trait]
pub trait RecoveryStore: Send + Sync {
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;

    async fn find_report(&self, id: Uuid) -> Result<Option<RecoveryReport>>;

    async fn find_report_by_event(&self, event_id: Uuid) -> Result<Option<RecoveryReport>>;

    /// Persist the report and move its event to `reported` atomically.
    ///
    /// Fails with `Conflict` if the event already has a report or is no
    /// longer open (cancelled or completed in the meantime).
    async fn insert_report(&self, data: CreateRecoveryReport) -> Result<RecoveryReport>;

    /// Reports newest first
    async fn list_reports(&self, filter: ReportFilter) -> Result<Vec<RecoveryReport>>;

    /// Apply content changes in one guarded write.
    ///
    /// A `has_food` change only lands while the report is still `pending`.
    /// `None` when no row matched: the report is missing, or it left
    /// `pending` before the write.
    async fn update_report_content(
        &self,
        id: Uuid,
        changes: &ReportContentUpdate,
    ) -> Result<Option<RecoveryReport>>;
}

/// PostgreSQL-backed recovery store
pub struct PgRecoveryStore {
    pool: PgPool,
}

impl PgRecoveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecoveryStore for PgRecoveryStore {
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", Event::COLUMNS);

        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get event: {:?}", e);
                AppError::Database(e)
            })
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
            .map_err(|e| {
                tracing::error!("Failed to get recovery report: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_report_by_event(&self, event_id: Uuid) -> Result<Option<RecoveryReport>> {
        let sql = format!(
            "SELECT {} FROM recovery_reports WHERE event_id = $1",
            RecoveryReport::COLUMNS
        );

        sqlx::query_as::<_, RecoveryReport>(&sql)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get recovery report by event: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn insert_report(&self, data: CreateRecoveryReport) -> Result<RecoveryReport> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            INSERT INTO recovery_reports (
                event_id, reporter_id, has_food, food_quantity, food_description,
                notes, photo_urls
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            RecoveryReport::COLUMNS
        );

        let report = sqlx::query_as::<_, RecoveryReport>(&sql)
            .bind(data.event_id)
            .bind(data.reporter_id)
            .bind(data.has_food)
            .bind(&data.food_quantity)
            .bind(&data.food_description)
            .bind(&data.notes)
            .bind(&data.photo_urls)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::from_constraint(e, "A recovery report already exists for this event")
            })?;

        let moved = sqlx::query(
            r#"
            UPDATE events
            SET status = 'reported', updated_at = NOW()
            WHERE id = $1 AND status IN ('scheduled', 'assigned')
            "#,
        )
        .bind(data.event_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark event reported: {:?}", e);
            AppError::Database(e)
        })?;

        if moved.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Event is no longer open for reporting".to_string(),
            ));
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit recovery report: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(report)
    }

    async fn list_reports(&self, filter: ReportFilter) -> Result<Vec<RecoveryReport>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM recovery_reports
            WHERE ($1::recovery_status IS NULL OR status = $1)
              AND ($2::boolean IS NULL OR has_food = $2)
            ORDER BY reported_at DESC
            "#,
            RecoveryReport::COLUMNS
        );

        sqlx::query_as::<_, RecoveryReport>(&sql)
            .bind(filter.status)
            .bind(filter.has_food)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list recovery reports: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update_report_content(
        &self,
        id: Uuid,
        changes: &ReportContentUpdate,
    ) -> Result<Option<RecoveryReport>> {
        let sql = format!(
            r#"
            UPDATE recovery_reports
            SET has_food = COALESCE($2, has_food),
                food_quantity = COALESCE($3, food_quantity),
                food_description = COALESCE($4, food_description),
                notes = COALESCE($5, notes),
                photo_urls = COALESCE($6, photo_urls),
                updated_at = NOW()
            WHERE id = $1
              AND ($2::boolean IS NULL OR $2 = has_food OR status = 'pending')
            RETURNING {}
            "#,
            RecoveryReport::COLUMNS
        );

        sqlx::query_as::<_, RecoveryReport>(&sql)
            .bind(id)
            .bind(changes.has_food)
            .bind(&changes.food_quantity)
            .bind(&changes.food_description)
            .bind(&changes.notes)
            .bind(&changes.photo_urls)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update recovery report: {:?}", e);
                AppError::Database(e)
            })
    }
}
