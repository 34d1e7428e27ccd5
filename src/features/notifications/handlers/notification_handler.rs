use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppQuery;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications::dtos::{
    MarkAllReadResponseDto, NotificationListQuery, NotificationResponseDto, UnreadCountDto,
};
use crate::features::notifications::services::NotificationService;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Up to 50 notifications, newest first", body = ApiResponse<Vec<NotificationResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationResponseDto>>>> {
    let notifications = service.list(user.user_id, query.unread_only).await?;
    let total = notifications.len() as i64;
    let dtos: Vec<NotificationResponseDto> =
        notifications.into_iter().map(|n| n.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Count the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = ApiResponse<UnreadCountDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn unread_count(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<UnreadCountDto>>> {
    let count = service.unread_count(user.user_id).await?;
    Ok(Json(ApiResponse::ok(UnreadCountDto { count })))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationResponseDto>),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationResponseDto>>> {
    let notification = service.mark_read(id, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(notification.into()),
        Some("Notification marked as read".to_string()),
        None,
    )))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/mark-all-read",
    responses(
        (status = 200, description = "All notifications marked as read", body = ApiResponse<MarkAllReadResponseDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<MarkAllReadResponseDto>>> {
    let updated = service.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(MarkAllReadResponseDto { updated }),
        Some("All notifications marked as read".to_string()),
        None,
    )))
}
