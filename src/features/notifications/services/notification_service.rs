use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::Notification;
use crate::shared::constants::NOTIFICATION_LIST_LIMIT;

/// Service for reading a user's own notifications
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest notifications for a user, capped at `NOTIFICATION_LIST_LIMIT`
    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            Notification::COLUMNS
        );

        sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(NOTIFICATION_LIST_LIMIT)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list notifications: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count unread notifications: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Mark one notification read; someone else's notification is reported as missing
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification> {
        let sql = format!(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            Notification::COLUMNS
        );

        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to mark notification read: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    /// Returns the number of notifications that changed
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to mark all notifications read: {:?}", e);
                    AppError::Database(e)
                })?;

        Ok(result.rows_affected())
    }
}
