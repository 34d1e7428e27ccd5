use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::model::{AuthenticatedUser, Role};
use crate::features::deliveries::{
    dtos as deliveries_dtos, handlers as deliveries_handlers, models as deliveries_models,
};
use crate::features::events::{
    dtos as events_dtos, handlers as events_handlers, models as events_models,
};
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
};
use crate::features::partners::{
    dtos as partners_dtos, handlers as partners_handlers, models as partners_models,
};
use crate::features::recoveries::{
    dtos as recoveries_dtos, handlers as recoveries_handlers, models as recoveries_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Events
        events_handlers::list_events,
        events_handlers::get_event,
        events_handlers::create_event,
        events_handlers::import_events,
        events_handlers::update_event,
        events_handlers::delete_event,
        events_handlers::assign_reporter,
        events_handlers::unassign_reporter,
        // Partners
        partners_handlers::list_partners,
        partners_handlers::get_partner,
        partners_handlers::create_partner,
        partners_handlers::update_partner,
        partners_handlers::update_need_level,
        partners_handlers::delete_partner,
        partners_handlers::list_partner_deliveries,
        // Recovery reports
        recoveries_handlers::list_reports,
        recoveries_handlers::get_report,
        recoveries_handlers::create_report,
        recoveries_handlers::update_report,
        // Deliveries
        deliveries_handlers::list_deliveries,
        deliveries_handlers::get_delivery,
        deliveries_handlers::accept_delivery,
        deliveries_handlers::update_delivery_status,
        deliveries_handlers::cancel_delivery,
        // Notifications
        notifications_handlers::list_notifications,
        notifications_handlers::unread_count,
        notifications_handlers::mark_read,
        notifications_handlers::mark_all_read,
    ),
    components(
        schemas(
            // Shared
            Meta,
            Role,
            AuthenticatedUser,
            // Events
            events_models::EventStatus,
            events_dtos::CreateEventDto,
            events_dtos::UpdateEventDto,
            events_dtos::EventResponseDto,
            events_dtos::EventImportRowDto,
            events_dtos::ImportEventsDto,
            events_dtos::ImportRowErrorDto,
            events_dtos::ImportEventsResultDto,
            ApiResponse<events_dtos::EventResponseDto>,
            ApiResponse<Vec<events_dtos::EventResponseDto>>,
            ApiResponse<events_dtos::ImportEventsResultDto>,
            // Partners
            partners_models::NeedLevel,
            partners_dtos::CreatePartnerDto,
            partners_dtos::UpdatePartnerDto,
            partners_dtos::UpdateNeedLevelDto,
            partners_dtos::PartnerResponseDto,
            partners_dtos::PartnerStatsDto,
            partners_dtos::PartnerDetailResponseDto,
            ApiResponse<partners_dtos::PartnerResponseDto>,
            ApiResponse<Vec<partners_dtos::PartnerResponseDto>>,
            ApiResponse<partners_dtos::PartnerDetailResponseDto>,
            // Recovery reports
            recoveries_models::RecoveryStatus,
            recoveries_dtos::CreateRecoveryReportDto,
            recoveries_dtos::UpdateRecoveryReportDto,
            recoveries_dtos::RecoveryReportResponseDto,
            ApiResponse<recoveries_dtos::RecoveryReportResponseDto>,
            ApiResponse<Vec<recoveries_dtos::RecoveryReportResponseDto>>,
            // Deliveries
            deliveries_models::DeliveryStatus,
            deliveries_dtos::AcceptDeliveryDto,
            deliveries_dtos::UpdateDeliveryStatusDto,
            deliveries_dtos::CancelDeliveryDto,
            deliveries_dtos::DeliveryResponseDto,
            ApiResponse<deliveries_dtos::DeliveryResponseDto>,
            ApiResponse<Vec<deliveries_dtos::DeliveryResponseDto>>,
            // Notifications
            notifications_dtos::NotificationResponseDto,
            notifications_dtos::UnreadCountDto,
            notifications_dtos::MarkAllReadResponseDto,
            ApiResponse<Vec<notifications_dtos::NotificationResponseDto>>,
            ApiResponse<notifications_dtos::UnreadCountDto>,
            ApiResponse<notifications_dtos::MarkAllReadResponseDto>,
        )
    ),
    tags(
        (name = "events", description = "Catering events and reporter assignment"),
        (name = "partners", description = "Receiving organizations and their need levels"),
        (name = "recoveries", description = "Post-event surplus food reports"),
        (name = "deliveries", description = "Driver pickups and drop-offs"),
        (name = "notifications", description = "Per-user notification inbox"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Food Recovery API",
        version = "0.1.0",
        description = "API documentation for the food recovery service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
