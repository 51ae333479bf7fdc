use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::accounting::dtos::{
    CreateExpenseDto, ExpenseDto, FinancialSummaryDto, InvoiceDto,
};
use crate::features::accounting::services::AccountingService;
use crate::features::auth::guards::{RequireAdmin, RequireStaff};
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::{ApiResponse, Meta};

/// List invoices (students see their own)
#[utoipa::path(
    get,
    path = "/api/accounting/invoices",
    responses(
        (status = 200, description = "Invoices derived from requests", body = ApiResponse<Vec<InvoiceDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "accounting",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_invoices(
    user: AuthenticatedUser,
    State(service): State<Arc<AccountingService>>,
) -> Result<Json<ApiResponse<Vec<InvoiceDto>>>> {
    let invoices = service.list_invoices(&user).await?;
    let total = invoices.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(invoices),
        None,
        Some(Meta { total }),
    )))
}

/// List expenses
#[utoipa::path(
    get,
    path = "/api/accounting/expenses",
    responses(
        (status = 200, description = "Expense log", body = ApiResponse<Vec<ExpenseDto>>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "accounting",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_expenses(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<AccountingService>>,
) -> Result<Json<ApiResponse<Vec<ExpenseDto>>>> {
    let expenses = service.list_expenses().await?;
    let total = expenses.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(expenses),
        None,
        Some(Meta { total }),
    )))
}

/// Record an expense
#[utoipa::path(
    post,
    path = "/api/accounting/expenses",
    request_body = CreateExpenseDto,
    responses(
        (status = 201, description = "Expense recorded", body = ApiResponse<ExpenseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "accounting",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_expense(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AccountingService>>,
    AppJson(dto): AppJson<CreateExpenseDto>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let expense = service.create_expense(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(expense), None, None)),
    ))
}

/// Revenue, outstanding balance, expenses and profit
#[utoipa::path(
    get,
    path = "/api/accounting/summary",
    responses(
        (status = 200, description = "Financial summary", body = ApiResponse<FinancialSummaryDto>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "accounting",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn financial_summary(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<AccountingService>>,
) -> Result<Json<ApiResponse<FinancialSummaryDto>>> {
    let summary = service.summary(&user).await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::accounting::routes;
    use crate::features::requests::dtos::CreateRequestDto;
    use crate::features::requests::RequestService;
    use crate::shared::test_helpers::{create_admin, create_staff, create_student, test_pool, with_user};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    struct Fixture {
        service: Arc<AccountingService>,
        requests: Arc<RequestService>,
    }

    impl Fixture {
        async fn new() -> Self {
            let pool = test_pool().await;
            let requests = Arc::new(RequestService::new(pool.clone()));
            let service = Arc::new(AccountingService::new(pool, Arc::clone(&requests)));
            Self { service, requests }
        }

        fn server_as(&self, user: AuthenticatedUser) -> TestServer {
            let app = with_user(routes::routes(Arc::clone(&self.service)), user);
            TestServer::new(app).unwrap()
        }
    }

    fn order(request_type: &str) -> CreateRequestDto {
        CreateRequestDto {
            title: "Order".to_string(),
            description: String::new(),
            request_type: request_type.to_string(),
        }
    }

    #[tokio::test]
    async fn test_student_sees_own_invoices() {
        let fixture = Fixture::new().await;
        let student = create_student("std_1");
        fixture.requests.create(order("PhD Proposal"), &student).await.unwrap();
        fixture
            .requests
            .create(order("Essay"), &create_student("std_2"))
            .await
            .unwrap();

        let response = fixture.server_as(student).get("/api/accounting/invoices").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["id"], "INV-000001");
        assert_eq!(body["data"][0]["amount"], 450.0);
        assert_eq!(body["data"][0]["status"], "Pending");
    }

    #[tokio::test]
    async fn test_only_admin_records_expenses() {
        let fixture = Fixture::new().await;
        let payload = json!({
            "type": "Salary",
            "recipient": "Jane Staff",
            "amount": 3500.0,
            "date": "2024-02-01"
        });

        fixture
            .server_as(create_staff("stf_1"))
            .post("/api/accounting/expenses")
            .json(&payload)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let admin = fixture.server_as(create_admin("adm_1"));
        let response = admin.post("/api/accounting/expenses").json(&payload).await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["id"], "EXP-001");
        assert_eq!(body["data"]["type"], "Salary");

        let response = fixture
            .server_as(create_staff("stf_1"))
            .get("/api/accounting/expenses")
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_expense_requires_recipient() {
        let fixture = Fixture::new().await;

        fixture
            .server_as(create_admin("adm_1"))
            .post("/api/accounting/expenses")
            .json(&json!({ "type": "Salary", "recipient": "", "amount": 10.0 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expense_amount_out_of_range() {
        let fixture = Fixture::new().await;

        let response = fixture
            .server_as(create_admin("adm_1"))
            .post("/api/accounting/expenses")
            .json(&json!({ "type": "Salary", "recipient": "Jane Staff", "amount": 7.9e28 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);

        let listed = fixture.service.list_expenses().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_students_cannot_see_books() {
        let fixture = Fixture::new().await;
        let server = fixture.server_as(create_student("std_1"));

        server
            .get("/api/accounting/expenses")
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/accounting/summary")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_summary_route() {
        let fixture = Fixture::new().await;
        let admin = create_admin("adm_1");
        let request = fixture
            .requests
            .create(order("Essay"), &create_student("std_1"))
            .await
            .unwrap();
        fixture.requests.mark_paid(&request.id, &admin).await.unwrap();

        let response = fixture.server_as(admin).get("/api/accounting/summary").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["totalRevenue"], 250.0);
        assert_eq!(body["data"]["outstanding"], 0.0);
        assert_eq!(body["data"]["netProfit"], 250.0);
    }
}
