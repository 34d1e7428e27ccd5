use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::deliveries::models::{Delivery, DeliveryStatus};
use crate::features::deliveries::store::DeliveryFilter;

/// Request DTO for a driver accepting a recovery
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AcceptDeliveryDto {
    pub recovery_report_id: Uuid,

    /// Driver's pickup position; recorded in logs only
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub pickup_latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub pickup_longitude: Option<f64>,
}

/// Request DTO for moving a delivery forward
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDeliveryStatusDto {
    /// `picked_up` or `delivered`
    pub status: DeliveryStatus,

    /// Reference to an already-uploaded confirmation photo
    #[validate(length(min = 1, max = 2048, message = "Photo URL must be 1-2048 characters"))]
    pub photo_url: Option<String>,

    pub issues: Option<String>,
}

/// Request DTO for cancelling a delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CancelDeliveryDto {
    pub reason: Option<String>,
}

/// Query params for listing deliveries
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeliveryListQuery {
    pub status: Option<DeliveryStatus>,
    pub driver_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
}

impl From<DeliveryListQuery> for DeliveryFilter {
    fn from(query: DeliveryListQuery) -> Self {
        Self {
            status: query.status,
            driver_id: query.driver_id,
            partner_id: query.partner_id,
        }
    }
}

/// Response DTO for delivery
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponseDto {
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

impl From<Delivery> for DeliveryResponseDto {
    fn from(d: Delivery) -> Self {
        Self {
            id: d.id,
            recovery_report_id: d.recovery_report_id,
            driver_id: d.driver_id,
            partner_id: d.partner_id,
            status: d.status,
            pickup_time: d.pickup_time,
            delivery_time: d.delivery_time,
            pickup_photo_url: d.pickup_photo_url,
            delivery_photo_url: d.delivery_photo_url,
            issues: d.issues,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}
