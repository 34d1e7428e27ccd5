use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::recoveries::models::{RecoveryReport, RecoveryStatus};
use crate::features::recoveries::store::{ReportContentUpdate, ReportFilter};

/// Request DTO for filing a recovery report
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRecoveryReportDto {
    pub event_id: Uuid,

    pub has_food: bool,

    #[validate(length(max = 255, message = "Food quantity must not exceed 255 characters"))]
    pub food_quantity: Option<String>,

    pub food_description: Option<String>,
    pub notes: Option<String>,

    /// Opaque references to already-uploaded photos
    #[serde(default)]
    #[validate(length(max = 5, message = "At most 5 photos per report"))]
    pub photo_urls: Vec<String>,
}

/// Request DTO for revising report content; status is not writable here
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateRecoveryReportDto {
    pub has_food: Option<bool>,

    #[validate(length(max = 255, message = "Food quantity must not exceed 255 characters"))]
    pub food_quantity: Option<String>,

    pub food_description: Option<String>,
    pub notes: Option<String>,

    #[validate(length(max = 5, message = "At most 5 photos per report"))]
    pub photo_urls: Option<Vec<String>>,
}

impl From<UpdateRecoveryReportDto> for ReportContentUpdate {
    fn from(dto: UpdateRecoveryReportDto) -> Self {
        Self {
            has_food: dto.has_food,
            food_quantity: dto.food_quantity,
            food_description: dto.food_description,
            notes: dto.notes,
            photo_urls: dto.photo_urls,
        }
    }
}

/// Query params for listing recovery reports
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecoveryListQuery {
    pub status: Option<RecoveryStatus>,
    pub has_food: Option<bool>,
}

impl From<RecoveryListQuery> for ReportFilter {
    fn from(query: RecoveryListQuery) -> Self {
        Self {
            status: query.status,
            has_food: query.has_food,
        }
    }
}

/// Response DTO for recovery report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecoveryReportResponseDto {
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

impl From<RecoveryReport> for RecoveryReportResponseDto {
    fn from(r: RecoveryReport) -> Self {
        Self {
            id: r.id,
            event_id: r.event_id,
            reporter_id: r.reporter_id,
            has_food: r.has_food,
            food_quantity: r.food_quantity,
            food_description: r.food_description,
            notes: r.notes,
            photo_urls: r.photo_urls,
            status: r.status,
            reported_at: r.reported_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rejects_status_field() {
        let parsed: Result<UpdateRecoveryReportDto, _> =
            serde_json::from_str(r#"{"notes":"late","status":"delivered"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_create_defaults_photos_and_caps_them() {
        let event_id = Uuid::new_v4();
        let dto: CreateRecoveryReportDto =
            serde_json::from_value(serde_json::json!({ "event_id": event_id, "has_food": true }))
                .unwrap();
        assert!(dto.photo_urls.is_empty());
        assert!(dto.validate().is_ok());

        let crowded = CreateRecoveryReportDto {
            photo_urls: (0..6).map(|i| format!("/uploads/{}.jpg", i)).collect(),
            ..dto
        };
        assert!(crowded.validate().is_err());
    }
}
