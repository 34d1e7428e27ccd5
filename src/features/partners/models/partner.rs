use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Partner self-reported demand tier matching the `need_level` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "need_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NeedLevel {
    High,
    Medium,
    Low,
}

impl NeedLevel {
    /// Ranking tier for assignment; `None` means not eligible for ranked selection
    pub fn priority(self) -> Option<u8> {
        match self {
            NeedLevel::High => Some(0),
            NeedLevel::Medium => Some(1),
            NeedLevel::Low => None,
        }
    }
}

impl std::fmt::Display for NeedLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeedLevel::High => write!(f, "high"),
            NeedLevel::Medium => write!(f, "medium"),
            NeedLevel::Low => write!(f, "low"),
        }
    }
}

/// Database model for partner
#[derive(Debug, Clone, FromRow)]
pub struct Partner {
    pub id: Uuid,
    pub organization_name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub operating_hours: Option<String>,
    pub food_preferences: Option<String>,
    pub delivery_instructions: Option<String>,
    pub current_need_level: NeedLevel,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    pub const COLUMNS: &'static str = "id, organization_name, address, latitude, longitude, \
        contact_name, contact_phone, contact_email, operating_hours, food_preferences, \
        delivery_instructions, current_need_level, active, created_at, updated_at";
}

/// Point-in-time view of a partner used by the assignment policy
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PartnerSnapshot {
    pub id: Uuid,
    pub active: bool,
    pub need_level: NeedLevel,
    /// Deliveries to this partner that reached `delivered`
    pub delivered_count: i64,
}

/// Delivery statistics for a partner
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PartnerStats {
    pub total_deliveries: i64,
    pub completed_deliveries: i64,
}

/// Data for creating a new partner
#[derive(Debug, Clone)]
pub struct CreatePartner {
    pub organization_name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub operating_hours: Option<String>,
    pub food_preferences: Option<String>,
    pub delivery_instructions: Option<String>,
    pub current_need_level: NeedLevel,
}
