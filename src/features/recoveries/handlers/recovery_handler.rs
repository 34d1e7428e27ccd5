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
use crate::features::auth::guards::RequireReporterOrAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::recoveries::dtos::{
    CreateRecoveryReportDto, RecoveryListQuery, RecoveryReportResponseDto,
    UpdateRecoveryReportDto,
};
use crate::features::recoveries::services::RecoveryService;
use crate::shared::types::{ApiResponse, Meta};

/// List recovery reports
#[utoipa::path(
    get,
    path = "/api/recoveries",
    params(RecoveryListQuery),
    responses(
        (status = 200, description = "Reports, newest first", body = ApiResponse<Vec<RecoveryReportResponseDto>>),
        (status = 400, description = "Invalid filter")
    ),
    security(("bearer_auth" = [])),
    tag = "recoveries"
)]
pub async fn list_reports(
    _user: AuthenticatedUser,
    State(service): State<Arc<RecoveryService>>,
    AppQuery(query): AppQuery<RecoveryListQuery>,
) -> Result<Json<ApiResponse<Vec<RecoveryReportResponseDto>>>> {
    let reports = service.list(query.into()).await?;
    let total = reports.len() as i64;
    let dtos: Vec<RecoveryReportResponseDto> = reports.into_iter().map(|r| r.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get recovery report by ID
#[utoipa::path(
    get,
    path = "/api/recoveries/{id}",
    params(
        ("id" = Uuid, Path, description = "Recovery report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<RecoveryReportResponseDto>),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "recoveries"
)]
pub async fn get_report(
    _user: AuthenticatedUser,
    State(service): State<Arc<RecoveryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RecoveryReportResponseDto>>> {
    let report = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(report.into())))
}

/// File a recovery report (assigned reporter or admin)
#[utoipa::path(
    post,
    path = "/api/recoveries",
    request_body = CreateRecoveryReportDto,
    responses(
        (status = 201, description = "Report filed", body = ApiResponse<RecoveryReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not assigned to this event"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event already reported or closed")
    ),
    security(("bearer_auth" = [])),
    tag = "recoveries"
)]
pub async fn create_report(
    RequireReporterOrAdmin(user): RequireReporterOrAdmin,
    State(service): State<Arc<RecoveryService>>,
    AppJson(dto): AppJson<CreateRecoveryReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<RecoveryReportResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(report.into()),
            Some("Recovery report created successfully".to_string()),
            None,
        )),
    ))
}

/// Revise a recovery report (filing reporter or admin)
#[utoipa::path(
    put,
    path = "/api/recoveries/{id}",
    params(
        ("id" = Uuid, Path, description = "Recovery report ID")
    ),
    request_body = UpdateRecoveryReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<RecoveryReportResponseDto>),
        (status = 403, description = "Not the filing reporter"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report already claimed")
    ),
    security(("bearer_auth" = [])),
    tag = "recoveries"
)]
pub async fn update_report(
    RequireReporterOrAdmin(user): RequireReporterOrAdmin,
    State(service): State<Arc<RecoveryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateRecoveryReportDto>,
) -> Result<Json<ApiResponse<RecoveryReportResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.update(id, &user, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(report.into()),
        Some("Recovery report updated successfully".to_string()),
        None,
    )))
}
