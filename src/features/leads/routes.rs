use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::leads::handlers;
use crate::features::leads::services::LeadService;

/// Create routes for the CRM feature
pub fn routes(service: Arc<LeadService>) -> Router {
    Router::new()
        .route(
            "/api/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route("/api/leads/summary", get(handlers::lead_summary))
        .route(
            "/api/leads/{id}",
            get(handlers::get_lead)
                .patch(handlers::update_lead)
                .delete(handlers::delete_lead),
        )
        .route(
            "/api/leads/{id}/logs",
            get(handlers::list_lead_logs).post(handlers::add_lead_log),
        )
        .with_state(service)
}
