use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::partners::models::{CreatePartner, NeedLevel, Partner, PartnerStats};

/// Request DTO for registering a partner organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePartnerDto {
    #[validate(length(min = 1, max = 255, message = "Organization name must be 1-255 characters"))]
    pub organization_name: String,

    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,

    #[validate(length(min = 1, max = 255, message = "Contact name must be 1-255 characters"))]
    pub contact_name: String,

    #[validate(length(max = 50, message = "Contact phone must not exceed 50 characters"))]
    pub contact_phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,

    pub operating_hours: Option<String>,
    pub food_preferences: Option<String>,
    pub delivery_instructions: Option<String>,

    /// Defaults to `medium`
    pub current_need_level: Option<NeedLevel>,
}

impl From<CreatePartnerDto> for CreatePartner {
    fn from(dto: CreatePartnerDto) -> Self {
        Self {
            organization_name: dto.organization_name.trim().to_string(),
            address: dto.address.trim().to_string(),
            latitude: dto.latitude,
            longitude: dto.longitude,
            contact_name: dto.contact_name.trim().to_string(),
            contact_phone: dto.contact_phone,
            contact_email: dto.contact_email,
            operating_hours: dto.operating_hours,
            food_preferences: dto.food_preferences,
            delivery_instructions: dto.delivery_instructions,
            current_need_level: dto.current_need_level.unwrap_or(NeedLevel::Medium),
        }
    }
}

/// Request DTO for a partial partner update (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePartnerDto {
    #[validate(length(min = 1, max = 255, message = "Organization name must be 1-255 characters"))]
    pub organization_name: Option<String>,

    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,

    #[validate(length(min = 1, max = 255, message = "Contact name must be 1-255 characters"))]
    pub contact_name: Option<String>,

    #[validate(length(max = 50, message = "Contact phone must not exceed 50 characters"))]
    pub contact_phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,

    pub operating_hours: Option<String>,
    pub food_preferences: Option<String>,
    pub delivery_instructions: Option<String>,
    pub current_need_level: Option<NeedLevel>,
    pub active: Option<bool>,
}

/// Request DTO for a partner reporting its current demand
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateNeedLevelDto {
    pub current_need_level: NeedLevel,
}

/// Query params for listing partners
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PartnerListQuery {
    pub active: Option<bool>,
}

/// Response DTO for partner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartnerResponseDto {
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

impl From<Partner> for PartnerResponseDto {
    fn from(p: Partner) -> Self {
        Self {
            id: p.id,
            organization_name: p.organization_name,
            address: p.address,
            latitude: p.latitude,
            longitude: p.longitude,
            contact_name: p.contact_name,
            contact_phone: p.contact_phone,
            contact_email: p.contact_email,
            operating_hours: p.operating_hours,
            food_preferences: p.food_preferences,
            delivery_instructions: p.delivery_instructions,
            current_need_level: p.current_need_level,
            active: p.active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartnerStatsDto {
    pub total_deliveries: i64,
    pub completed_deliveries: i64,
}

impl From<PartnerStats> for PartnerStatsDto {
    fn from(s: PartnerStats) -> Self {
        Self {
            total_deliveries: s.total_deliveries,
            completed_deliveries: s.completed_deliveries,
        }
    }
}

/// Response DTO for partner with delivery statistics
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartnerDetailResponseDto {
    #[serde(flatten)]
    pub partner: PartnerResponseDto,
    pub stats: PartnerStatsDto,
}
