use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireDriver, RequireDriverOrAdmin};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::deliveries::dtos::{
    AcceptDeliveryDto, CancelDeliveryDto, DeliveryListQuery, DeliveryResponseDto,
    UpdateDeliveryStatusDto,
};
use crate::features::deliveries::services::DeliveryService;
use crate::shared::types::{ApiResponse, Meta};

/// List deliveries
#[utoipa::path(
    get,
    path = "/api/deliveries",
    params(DeliveryListQuery),
    responses(
        (status = 200, description = "Deliveries, newest first", body = ApiResponse<Vec<DeliveryResponseDto>>),
        (status = 400, description = "Invalid filter")
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn list_deliveries(
    _user: AuthenticatedUser,
    State(service): State<Arc<DeliveryService>>,
    AppQuery(query): AppQuery<DeliveryListQuery>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponseDto>>>> {
    let deliveries = service.list(query.into()).await?;
    let total = deliveries.len() as i64;
    let dtos: Vec<DeliveryResponseDto> = deliveries.into_iter().map(|d| d.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get delivery by ID
#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    responses(
        (status = 200, description = "Delivery found", body = ApiResponse<DeliveryResponseDto>),
        (status = 404, description = "Delivery not found")
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn get_delivery(
    _user: AuthenticatedUser,
    State(service): State<Arc<DeliveryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeliveryResponseDto>>> {
    let delivery = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(delivery.into())))
}

/// Accept a pending recovery (driver)
#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = AcceptDeliveryDto,
    responses(
        (status = 201, description = "Delivery accepted", body = ApiResponse<DeliveryResponseDto>),
        (status = 400, description = "Report has no food"),
        (status = 403, description = "Only drivers can accept deliveries"),
        (status = 404, description = "Recovery report not found"),
        (status = 409, description = "Recovery already taken"),
        (status = 503, description = "No available partners")
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn accept_delivery(
    RequireDriver(driver): RequireDriver,
    State(service): State<Arc<DeliveryService>>,
    AppJson(dto): AppJson<AcceptDeliveryDto>,
) -> Result<(StatusCode, Json<ApiResponse<DeliveryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let pickup = dto.pickup_latitude.zip(dto.pickup_longitude);
    let delivery = service
        .accept(&driver, dto.recovery_report_id, pickup)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(delivery.into()),
            Some("Delivery accepted successfully".to_string()),
            None,
        )),
    ))
}

/// Record pickup or drop-off (assigned driver or admin)
#[utoipa::path(
    put,
    path = "/api/deliveries/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    request_body = UpdateDeliveryStatusDto,
    responses(
        (status = 200, description = "Delivery status updated", body = ApiResponse<DeliveryResponseDto>),
        (status = 400, description = "Unsupported target status"),
        (status = 403, description = "Not the assigned driver"),
        (status = 404, description = "Delivery not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn update_delivery_status(
    RequireDriverOrAdmin(user): RequireDriverOrAdmin,
    State(service): State<Arc<DeliveryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateDeliveryStatusDto>,
) -> Result<Json<ApiResponse<DeliveryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let delivery = service
        .update_status(id, &user, dto.status, dto.photo_url, dto.issues)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(delivery.into()),
        Some("Delivery status updated successfully".to_string()),
        None,
    )))
}

/// Cancel a delivery and re-queue its report (assigned driver or admin)
#[utoipa::path(
    post,
    path = "/api/deliveries/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    request_body = CancelDeliveryDto,
    responses(
        (status = 200, description = "Delivery cancelled", body = ApiResponse<DeliveryResponseDto>),
        (status = 403, description = "Not the assigned driver"),
        (status = 404, description = "Delivery not found"),
        (status = 409, description = "Delivery already finished")
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn cancel_delivery(
    RequireDriverOrAdmin(user): RequireDriverOrAdmin,
    State(service): State<Arc<DeliveryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CancelDeliveryDto>,
) -> Result<Json<ApiResponse<DeliveryResponseDto>>> {
    let delivery = service.cancel(id, &user, dto.reason).await?;
    Ok(Json(ApiResponse::success(
        Some(delivery.into()),
        Some("Delivery cancelled successfully".to_string()),
        None,
    )))
}
