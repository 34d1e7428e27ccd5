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
use crate::features::auth::guards::{RequireAdmin, RequireReporter};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::events::dtos::{
    CreateEventDto, EventListQuery, EventResponseDto, ImportEventsDto, ImportEventsResultDto,
    UpdateEventDto,
};
use crate::features::events::services::EventService;
use crate::shared::types::{ApiResponse, Meta};

/// List events
#[utoipa::path(
    get,
    path = "/api/events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events ordered by start time", body = ApiResponse<Vec<EventResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn list_events(
    _user: AuthenticatedUser,
    State(service): State<Arc<EventService>>,
    AppQuery(query): AppQuery<EventListQuery>,
) -> Result<Json<ApiResponse<Vec<EventResponseDto>>>> {
    let (events, total) = service.list(&query).await?;
    let dtos: Vec<EventResponseDto> = events.into_iter().map(|e| e.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = ApiResponse<EventResponseDto>),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn get_event(
    _user: AuthenticatedUser,
    State(service): State<Arc<EventService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EventResponseDto>>> {
    let event = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(event.into())))
}

/// Create an event (admin)
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventDto,
    responses(
        (status = 201, description = "Event created", body = ApiResponse<EventResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn create_event(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<EventService>>,
    AppJson(dto): AppJson<CreateEventDto>,
) -> Result<(StatusCode, Json<ApiResponse<EventResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let event = service.create(dto.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(event.into()),
            Some("Event created successfully".to_string()),
            None,
        )),
    ))
}

/// Import events from pre-parsed spreadsheet rows (admin)
///
/// Rows are created independently; failures are reported per row and do not
/// affect the others.
#[utoipa::path(
    post,
    path = "/api/events/bulk",
    request_body = ImportEventsDto,
    responses(
        (status = 200, description = "Import processed", body = ApiResponse<ImportEventsResultDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn import_events(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<EventService>>,
    AppJson(dto): AppJson<ImportEventsDto>,
) -> Result<Json<ApiResponse<ImportEventsResultDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service.import_rows(dto.rows).await;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Import processed".to_string()),
        None,
    )))
}

/// Update an event (admin)
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = UpdateEventDto,
    responses(
        (status = 200, description = "Event updated", body = ApiResponse<EventResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event can no longer be cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn update_event(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<EventService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateEventDto>,
) -> Result<Json<ApiResponse<EventResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let event = service.update(id, &dto).await?;
    Ok(Json(ApiResponse::ok(event.into())))
}

/// Delete an event (admin)
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event has a recovery report")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn delete_event(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<EventService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Event deleted successfully".to_string()),
        None,
    )))
}

/// Assign the calling reporter to an event
#[utoipa::path(
    post,
    path = "/api/events/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Reporter assigned", body = ApiResponse<EventResponseDto>),
        (status = 403, description = "Only reporters can assign themselves"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn assign_reporter(
    RequireReporter(reporter): RequireReporter,
    State(service): State<Arc<EventService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EventResponseDto>>> {
    let event = service.assign_reporter(id, reporter.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(event.into()),
        Some("Successfully assigned to event".to_string()),
        None,
    )))
}

/// Remove the reporter from an event (the reporter or an admin)
#[utoipa::path(
    post,
    path = "/api/events/{id}/unassign",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Reporter unassigned", body = ApiResponse<EventResponseDto>),
        (status = 403, description = "Not the assigned reporter"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "A report was already filed")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn unassign_reporter(
    user: AuthenticatedUser,
    State(service): State<Arc<EventService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EventResponseDto>>> {
    let event = service.unassign_reporter(id, &user).await?;
    Ok(Json(ApiResponse::ok(event.into())))
}
