use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::recoveries::handlers;
use crate::features::recoveries::services::RecoveryService;

/// Create routes for the recoveries feature (auth middleware applied by caller)
pub fn routes(service: Arc<RecoveryService>) -> Router {
    Router::new()
        .route(
            "/api/recoveries",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/api/recoveries/{id}",
            get(handlers::get_report).put(handlers::update_report),
        )
        .with_state(service)
}
