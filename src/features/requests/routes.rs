use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::requests::handlers;
use crate::features::requests::services::RequestService;

/// Create routes for the requests feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<RequestService>) -> Router {
    Router::new()
        .route(
            "/api/requests",
            get(handlers::list_requests).post(handlers::create_request),
        )
        .route("/api/requests/queue", get(handlers::staff_queue))
        .route("/api/requests/stats", get(handlers::request_stats))
        .route(
            "/api/requests/{id}",
            get(handlers::get_request).patch(handlers::update_request),
        )
        .route("/api/requests/{id}/claim", post(handlers::claim_request))
        .route("/api/requests/{id}/submit", post(handlers::submit_work))
        .route("/api/requests/{id}/verify", post(handlers::verify_request))
        .route("/api/requests/{id}/pay", post(handlers::pay_request))
        .with_state(service)
}
