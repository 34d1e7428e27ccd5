use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::NOTIFICATION_KIND_NEW_RECOVERY;

/// A message fanned out to every active driver
#[derive(Debug, Clone, PartialEq)]
pub struct DriverNotice {
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
}

impl DriverNotice {
    /// Food is waiting at an event for someone to pick it up
    pub fn new_recovery(
        report_id: Uuid,
        event_title: &str,
        location: &str,
        quantity: Option<&str>,
    ) -> Self {
        Self {
            kind: NOTIFICATION_KIND_NEW_RECOVERY,
            title: "New Food Recovery Available!".to_string(),
            message: format!(
                "Food available at {} ({}). Quantity: {}",
                event_title,
                location,
                quantity.unwrap_or("Not specified")
            ),
            related_id: Some(report_id),
        }
    }
}

/// Outbound notification channel
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver the notice to all active drivers, returning how many were reached
    async fn notify_active_drivers(&self, notice: DriverNotice) -> Result<u64>;
}

/// Writes one notification row per active driver
pub struct PgNotificationDispatcher {
    pool: PgPool,
}

impl PgNotificationDispatcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationDispatcher for PgNotificationDispatcher {
    async fn notify_active_drivers(&self, notice: DriverNotice) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, related_id)
            SELECT id, $1, $2, $3, $4
            FROM users
            WHERE role = 'driver' AND active
            "#,
        )
        .bind(notice.kind)
        .bind(&notice.title)
        .bind(&notice.message)
        .bind(notice.related_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to notify drivers: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recovery_notice_text() {
        let id = Uuid::new_v4();
        let notice = DriverNotice::new_recovery(id, "Gala", "Town hall", Some("3 trays"));
        assert_eq!(notice.kind, "new_recovery");
        assert_eq!(notice.message, "Food available at Gala (Town hall). Quantity: 3 trays");
        assert_eq!(notice.related_id, Some(id));
    }

    #[test]
    fn test_new_recovery_notice_without_quantity() {
        let notice = DriverNotice::new_recovery(Uuid::new_v4(), "Gala", "Town hall", None);
        assert!(notice.message.ends_with("Quantity: Not specified"));
    }
}
