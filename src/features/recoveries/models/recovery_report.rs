use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Pipeline status of a recovery report, matching the `recovery_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "recovery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    Pending,
    Assigned,
    PickedUp,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for RecoveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryStatus::Pending => write!(f, "pending"),
            RecoveryStatus::Assigned => write!(f, "assigned"),
            RecoveryStatus::PickedUp => write!(f, "picked_up"),
            RecoveryStatus::Delivered => write!(f, "delivered"),
            RecoveryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Database model for recovery report
#[derive(Debug, Clone, FromRow)]
pub struct RecoveryReport {
    pub id: Uuid,
    pub event_id: Uuid,
    pub reporter_id: Uuid,
    pub has_food: bool,
    pub food_quantity: Option<String>,
    pub food_description: Option<String>,
    pub notes: Option<String>,
    pub photo_urls: Vec<String>,
    pub status: RecoveryStatus,
    pub reported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecoveryReport {
    pub const COLUMNS: &'static str = "id, event_id, reporter_id, has_food, food_quantity, \
        food_description, notes, photo_urls, status, reported_at, updated_at";

    /// Open for a driver to accept
    pub fn is_claimable(&self) -> bool {
        self.has_food && self.status == RecoveryStatus::Pending
    }
}

/// Data for filing a recovery report
#[derive(Debug, Clone)]
pub struct CreateRecoveryReport {
    pub event_id: Uuid,
    pub reporter_id: Uuid,
    pub has_food: bool,
    pub food_quantity: Option<String>,
    pub food_description: Option<String>,
    pub notes: Option<String>,
    pub photo_urls: Vec<String>,
}
