use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::accounting::{
    dtos as accounting_dtos, handlers as accounting_handlers, models as accounting_models,
};
use crate::features::auth;
use crate::features::leads::{dtos as leads_dtos, handlers as leads_handlers, models as leads_models};
use crate::features::requests::{
    dtos as requests_dtos, handlers as requests_handlers, models as requests_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::login,
        auth::handlers::get_me,
        // Users
        users_handlers::list_users,
        users_handlers::create_user,
        users_handlers::get_user,
        users_handlers::update_user,
        users_handlers::delete_user,
        users_handlers::get_profile,
        users_handlers::update_profile,
        users_handlers::change_password,
        // Requests
        requests_handlers::list_requests,
        requests_handlers::create_request,
        requests_handlers::get_request,
        requests_handlers::update_request,
        requests_handlers::staff_queue,
        requests_handlers::request_stats,
        requests_handlers::claim_request,
        requests_handlers::submit_work,
        requests_handlers::verify_request,
        requests_handlers::pay_request,
        // Leads
        leads_handlers::list_leads,
        leads_handlers::lead_summary,
        leads_handlers::create_lead,
        leads_handlers::get_lead,
        leads_handlers::update_lead,
        leads_handlers::delete_lead,
        leads_handlers::list_lead_logs,
        leads_handlers::add_lead_log,
        // Accounting
        accounting_handlers::list_invoices,
        accounting_handlers::list_expenses,
        accounting_handlers::create_expense,
        accounting_handlers::financial_summary,
    ),
    components(
        schemas(
            Meta,
            // Auth
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            // Users
            users_models::UserRole,
            users_dtos::UserResponseDto,
            users_dtos::CreateUserDto,
            users_dtos::UpdateUserDto,
            users_dtos::UpdateProfileDto,
            users_dtos::ChangePasswordDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Requests
            requests_models::RequestStatus,
            requests_dtos::RequestResponseDto,
            requests_dtos::CreateRequestDto,
            requests_dtos::UpdateRequestDto,
            requests_dtos::SubmitWorkDto,
            requests_dtos::VerifyRequestDto,
            requests_dtos::RequestStatsDto,
            ApiResponse<requests_dtos::RequestResponseDto>,
            ApiResponse<Vec<requests_dtos::RequestResponseDto>>,
            ApiResponse<requests_dtos::RequestStatsDto>,
            // Leads
            leads_models::LeadStatus,
            leads_models::LeadLogAction,
            leads_dtos::LeadResponseDto,
            leads_dtos::CreateLeadDto,
            leads_dtos::UpdateLeadDto,
            leads_dtos::LeadStatusCount,
            leads_dtos::LeadSummaryDto,
            leads_dtos::LeadLogResponseDto,
            leads_dtos::CreateLeadLogDto,
            ApiResponse<leads_dtos::LeadResponseDto>,
            ApiResponse<Vec<leads_dtos::LeadResponseDto>>,
            ApiResponse<leads_dtos::LeadSummaryDto>,
            ApiResponse<leads_dtos::LeadLogResponseDto>,
            ApiResponse<Vec<leads_dtos::LeadLogResponseDto>>,
            // Accounting
            accounting_models::InvoiceStatus,
            accounting_dtos::InvoiceDto,
            accounting_dtos::ExpenseDto,
            accounting_dtos::CreateExpenseDto,
            accounting_dtos::FinancialSummaryDto,
            ApiResponse<Vec<accounting_dtos::InvoiceDto>>,
            ApiResponse<Vec<accounting_dtos::ExpenseDto>>,
            ApiResponse<accounting_dtos::ExpenseDto>,
            ApiResponse<accounting_dtos::FinancialSummaryDto>,
        )
    ),
    tags(
        (name = "auth", description = "Login and current user"),
        (name = "users", description = "User accounts and profiles"),
        (name = "requests", description = "Assignment requests and fulfilment workflow"),
        (name = "leads", description = "CRM leads and activity logs"),
        (name = "accounting", description = "Invoices, expenses and financial summary"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Lexora API",
        version = "0.1.0",
        description = "API documentation for Lexora",
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_feature() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/me/password",
            "/api/requests/{id}/verify",
            "/api/leads/{id}/logs",
            "/api/accounting/summary",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }

        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
