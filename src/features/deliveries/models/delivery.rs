use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Delivery lifecycle status matching the `delivery_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Accepted,
    PickedUp,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Anything but `cancelled` occupies the report's single live slot
    pub fn is_live(self) -> bool {
        self != DeliveryStatus::Cancelled
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Accepted => write!(f, "accepted"),
            DeliveryStatus::PickedUp => write!(f, "picked_up"),
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Database model for delivery
#[derive(Debug, Clone, FromRow)]
pub struct Delivery {
    pub id: Uuid,
    pub recovery_report_id: Uuid,
    pub driver_id: Uuid,
    pub partner_id: Uuid,
    pub status: DeliveryStatus,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub pickup_photo_url: Option<String>,
    pub delivery_photo_url: Option<String>,
    pub issues: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub const COLUMNS: &'static str = "id, recovery_report_id, driver_id, partner_id, status, \
        pickup_time, delivery_time, pickup_photo_url, delivery_photo_url, issues, created_at, \
        updated_at";
}
