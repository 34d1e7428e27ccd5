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
use crate::features::auth::guards::{RequireAdmin, RequirePartnerOrAdmin};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::deliveries::dtos::DeliveryResponseDto;
use crate::features::partners::dtos::{
    CreatePartnerDto, PartnerDetailResponseDto, PartnerListQuery, PartnerResponseDto,
    UpdateNeedLevelDto, UpdatePartnerDto,
};
use crate::features::partners::services::PartnerService;
use crate::shared::types::{ApiResponse, Meta};

/// List partners
#[utoipa::path(
    get,
    path = "/api/partners",
    params(PartnerListQuery),
    responses(
        (status = 200, description = "Partners ordered by name", body = ApiResponse<Vec<PartnerResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn list_partners(
    _user: AuthenticatedUser,
    State(service): State<Arc<PartnerService>>,
    AppQuery(query): AppQuery<PartnerListQuery>,
) -> Result<Json<ApiResponse<Vec<PartnerResponseDto>>>> {
    let partners = service.list(query.active).await?;
    let total = partners.len() as i64;
    let dtos: Vec<PartnerResponseDto> = partners.into_iter().map(|p| p.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get partner by ID with delivery statistics
#[utoipa::path(
    get,
    path = "/api/partners/{id}",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Partner found", body = ApiResponse<PartnerDetailResponseDto>),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn get_partner(
    _user: AuthenticatedUser,
    State(service): State<Arc<PartnerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PartnerDetailResponseDto>>> {
    let (partner, stats) = service.get_with_stats(id).await?;
    Ok(Json(ApiResponse::ok(PartnerDetailResponseDto {
        partner: partner.into(),
        stats: stats.into(),
    })))
}

/// Register a partner (admin)
#[utoipa::path(
    post,
    path = "/api/partners",
    request_body = CreatePartnerDto,
    responses(
        (status = 201, description = "Partner created", body = ApiResponse<PartnerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn create_partner(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<PartnerService>>,
    AppJson(dto): AppJson<CreatePartnerDto>,
) -> Result<(StatusCode, Json<ApiResponse<PartnerResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let partner = service.create(dto.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(partner.into()),
            Some("Partner created successfully".to_string()),
            None,
        )),
    ))
}

/// Update a partner (admin)
#[utoipa::path(
    put,
    path = "/api/partners/{id}",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    request_body = UpdatePartnerDto,
    responses(
        (status = 200, description = "Partner updated", body = ApiResponse<PartnerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn update_partner(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<PartnerService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdatePartnerDto>,
) -> Result<Json<ApiResponse<PartnerResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let partner = service.update(id, &dto).await?;
    Ok(Json(ApiResponse::ok(partner.into())))
}

/// Report a partner's current need level (partner or admin)
#[utoipa::path(
    patch,
    path = "/api/partners/{id}/need-level",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    request_body = UpdateNeedLevelDto,
    responses(
        (status = 200, description = "Need level updated", body = ApiResponse<PartnerResponseDto>),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn update_need_level(
    RequirePartnerOrAdmin(_user): RequirePartnerOrAdmin,
    State(service): State<Arc<PartnerService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateNeedLevelDto>,
) -> Result<Json<ApiResponse<PartnerResponseDto>>> {
    let partner = service.update_need_level(id, dto.current_need_level).await?;
    Ok(Json(ApiResponse::success(
        Some(partner.into()),
        Some("Need level updated".to_string()),
        None,
    )))
}

/// Delete a partner (admin)
#[utoipa::path(
    delete,
    path = "/api/partners/{id}",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Partner deleted"),
        (status = 404, description = "Partner not found"),
        (status = 409, description = "Partner has deliveries")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn delete_partner(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<PartnerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Partner deleted successfully".to_string()),
        None,
    )))
}

/// List deliveries routed to a partner
#[utoipa::path(
    get,
    path = "/api/partners/{id}/deliveries",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Deliveries, newest first", body = ApiResponse<Vec<DeliveryResponseDto>>),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "partners"
)]
pub async fn list_partner_deliveries(
    _user: AuthenticatedUser,
    State(service): State<Arc<PartnerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponseDto>>>> {
    let deliveries = service.list_deliveries(id).await?;
    let total = deliveries.len() as i64;
    let dtos: Vec<DeliveryResponseDto> = deliveries.into_iter().map(|d| d.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::partners::routes::routes;
    use crate::shared::test_helpers::{admin_user, driver_user, lazy_pool, with_user};
    use axum_test::TestServer;
    use serde_json::json;

    fn server(user: AuthenticatedUser) -> TestServer {
        let service = Arc::new(PartnerService::new(lazy_pool()));
        TestServer::new(with_user(routes(service), user)).unwrap()
    }

    #[tokio::test]
    async fn test_driver_cannot_change_need_level() {
        let response = server(driver_user())
            .patch(&format!("/api/partners/{}/need-level", Uuid::new_v4()))
            .json(&json!({ "current_need_level": "high" }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_driver_cannot_delete_partner() {
        let response = server(driver_user())
            .delete(&format!("/api/partners/{}", Uuid::new_v4()))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_partner_requires_contact_name() {
        let response = server(admin_user())
            .post("/api/partners")
            .json(&json!({
                "organization_name": "Harbor Pantry",
                "address": "1 Dock St",
                "contact_name": ""
            }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
