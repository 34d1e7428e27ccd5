use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::events::models::{CreateEvent, Event, EventStatus};
use crate::shared::types::PaginationQuery;

/// Request DTO for creating an event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateEventDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    #[validate(range(min = 0, message = "Expected attendees cannot be negative"))]
    pub expected_attendees: Option<i32>,

    pub food_type: Option<String>,
    pub catering_company: Option<String>,
    pub notes: Option<String>,
}

fn validate_create_window(dto: &CreateEventDto) -> Result<(), ValidationError> {
    check_window(dto.start_time, dto.end_time)
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::new("time_window")
            .with_message("End time must be after start time".into()));
    }
    Ok(())
}

impl From<CreateEventDto> for CreateEvent {
    fn from(dto: CreateEventDto) -> Self {
        Self {
            title: dto.title.trim().to_string(),
            location: dto.location.trim().to_string(),
            latitude: dto.latitude,
            longitude: dto.longitude,
            start_time: dto.start_time,
            end_time: dto.end_time,
            expected_attendees: dto.expected_attendees,
            food_type: dto.food_type,
            catering_company: dto.catering_company,
            notes: dto.notes,
        }
    }
}

/// Request DTO for a partial event update (admin)
///
/// `status` only accepts `cancelled`; every other status is driven by the
/// reporter and delivery workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update"))]
pub struct UpdateEventDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    #[validate(range(min = 0, message = "Expected attendees cannot be negative"))]
    pub expected_attendees: Option<i32>,

    pub food_type: Option<String>,
    pub catering_company: Option<String>,
    pub notes: Option<String>,
    pub status: Option<EventStatus>,
}

fn validate_update(dto: &UpdateEventDto) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (dto.start_time, dto.end_time) {
        check_window(start, end)?;
    }
    match dto.status {
        None | Some(EventStatus::Cancelled) => Ok(()),
        Some(_) => Err(ValidationError::new("status")
            .with_message("Only cancellation can be set directly on an event".into())),
    }
}

/// Query params for listing events
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    pub status: Option<EventStatus>,
    /// Only events starting at or after this instant
    pub from_date: Option<DateTime<Utc>>,
    /// Only events starting at or before this instant
    pub to_date: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl EventListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        let defaults = PaginationQuery::default();
        PaginationQuery {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }
}

/// Response DTO for event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponseDto {
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

impl From<Event> for EventResponseDto {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            title: e.title,
            location: e.location,
            latitude: e.latitude,
            longitude: e.longitude,
            start_time: e.start_time,
            end_time: e.end_time,
            expected_attendees: e.expected_attendees,
            food_type: e.food_type,
            catering_company: e.catering_company,
            notes: e.notes,
            reporter_id: e.reporter_id,
            status: e.status,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

// =============================================================================
// BULK IMPORT
// =============================================================================

/// One row handed over by the spreadsheet ingester, fields still loosely typed
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EventImportRowDto {
    pub title: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` read as UTC
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub expected_attendees: Option<i32>,
    pub food_type: Option<String>,
    pub catering_company: Option<String>,
    pub notes: Option<String>,
}

/// Request DTO for bulk event import
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportEventsDto {
    #[validate(length(min = 1, max = 1000, message = "Import must contain 1-1000 rows"))]
    pub rows: Vec<EventImportRowDto>,
}

/// Per-row failure; `row` counts the header line, so the first data row is 2
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportRowErrorDto {
    pub row: usize,
    pub error: String,
}

/// Response DTO for bulk event import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportEventsResultDto {
    pub inserted: usize,
    pub failed: usize,
    pub events: Vec<EventResponseDto>,
    pub errors: Vec<ImportRowErrorDto>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an import timestamp: RFC 3339 first, then naive forms taken as UTC
pub fn parse_import_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

impl TryFrom<EventImportRowDto> for CreateEventDto {
    type Error = String;

    fn try_from(row: EventImportRowDto) -> Result<Self, Self::Error> {
        let (Some(title), Some(location), Some(start_raw), Some(end_raw)) = (
            non_blank(row.title),
            non_blank(row.location),
            non_blank(row.start_time),
            non_blank(row.end_time),
        ) else {
            return Err("Missing required fields".to_string());
        };

        let start_time = parse_import_timestamp(&start_raw)
            .ok_or_else(|| format!("Invalid start_time: {}", start_raw))?;
        let end_time = parse_import_timestamp(&end_raw)
            .ok_or_else(|| format!("Invalid end_time: {}", end_raw))?;

        Ok(CreateEventDto {
            title,
            location,
            latitude: row.latitude,
            longitude: row.longitude,
            start_time,
            end_time,
            expected_attendees: row.expected_attendees,
            food_type: non_blank(row.food_type),
            catering_company: non_blank(row.catering_company),
            notes: non_blank(row.notes),
        })
    }
}
