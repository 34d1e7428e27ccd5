use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::deliveries::handlers;
use crate::features::deliveries::services::DeliveryService;

/// Create routes for the deliveries feature (auth middleware applied by caller)
pub fn routes(service: Arc<DeliveryService>) -> Router {
    Router::new()
        .route(
            "/api/deliveries",
            get(handlers::list_deliveries).post(handlers::accept_delivery),
        )
        .route("/api/deliveries/{id}", get(handlers::get_delivery))
        .route(
            "/api/deliveries/{id}/status",
            put(handlers::update_delivery_status),
        )
        .route("/api/deliveries/{id}/cancel", post(handlers::cancel_delivery))
        .with_state(service)
}
