use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::events::handlers;
use crate::features::events::services::EventService;

/// Create routes for the events feature (auth middleware applied by caller)
pub fn routes(service: Arc<EventService>) -> Router {
    Router::new()
        .route(
            "/api/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route("/api/events/bulk", post(handlers::import_events))
        .route(
            "/api/events/{id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route("/api/events/{id}/assign", post(handlers::assign_reporter))
        .route(
            "/api/events/{id}/unassign",
            post(handlers::unassign_reporter),
        )
        .with_state(service)
}
