use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::features::partners::handlers;
use crate::features::partners::services::PartnerService;

/// Create routes for the partners feature (auth middleware applied by caller)
pub fn routes(service: Arc<PartnerService>) -> Router {
    Router::new()
        .route(
            "/api/partners",
            get(handlers::list_partners).post(handlers::create_partner),
        )
        .route(
            "/api/partners/{id}",
            get(handlers::get_partner)
                .put(handlers::update_partner)
                .delete(handlers::delete_partner),
        )
        .route(
            "/api/partners/{id}/need-level",
            patch(handlers::update_need_level),
        )
        .route(
            "/api/partners/{id}/deliveries",
            get(handlers::list_partner_deliveries),
        )
        .with_state(service)
}
