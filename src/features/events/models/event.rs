use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Event lifecycle status matching the `event_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Assigned,
    Reported,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Whether a reporter may still be attached or detached
    pub fn is_open_for_reporter(self) -> bool {
        matches!(self, EventStatus::Scheduled | EventStatus::Assigned)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Scheduled => write!(f, "scheduled"),
            EventStatus::Assigned => write!(f, "assigned"),
            EventStatus::Reported => write!(f, "reported"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Database model for event
#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expected_attendees: Option<i32>,
    pub food_type: Option<String>,
    pub catering_company: Option<String>,
    pub notes: Option<String>,
    pub reporter_id: Option<Uuid>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub const COLUMNS: &'static str = "id, title, location, latitude, longitude, start_time, \
        end_time, expected_attendees, food_type, catering_company, notes, reporter_id, status, \
        created_at, updated_at";
}

/// Data for creating a new event
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expected_attendees: Option<i32>,
    pub food_type: Option<String>,
    pub catering_company: Option<String>,
    pub notes: Option<String>,
}
