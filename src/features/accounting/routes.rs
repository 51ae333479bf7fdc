use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::accounting::handlers;
use crate::features::accounting::services::AccountingService;

pub fn routes(service: Arc<AccountingService>) -> Router {
    Router::new()
        .route("/api/accounting/invoices", get(handlers::list_invoices))
        .route(
            "/api/accounting/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/api/accounting/summary", get(handlers::financial_summary))
        .with_state(service)
}
