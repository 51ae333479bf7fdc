use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireAdmin, RequireStaff};
use crate::features::leads::dtos::{
    CreateLeadDto, CreateLeadLogDto, LeadLogResponseDto, LeadResponseDto, LeadSummaryDto,
    ListLeadsQuery, UpdateLeadDto,
};
use crate::features::leads::services::LeadService;
use crate::shared::types::{ApiResponse, Meta};

/// List leads (staff see only their own)
#[utoipa::path(
    get,
    path = "/api/leads",
    params(ListLeadsQuery),
    responses(
        (status = 200, description = "List of leads", body = ApiResponse<Vec<LeadResponseDto>>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_leads(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
    AppQuery(query): AppQuery<ListLeadsQuery>,
) -> Result<Json<ApiResponse<Vec<LeadResponseDto>>>> {
    let leads = service.list(&query, &user).await?;
    let total = leads.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(leads),
        None,
        Some(Meta { total }),
    )))
}

/// Pipeline summary
#[utoipa::path(
    get,
    path = "/api/leads/summary",
    responses(
        (status = 200, description = "Counts per status and potential income", body = ApiResponse<LeadSummaryDto>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn lead_summary(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
) -> Result<Json<ApiResponse<LeadSummaryDto>>> {
    let summary = service.summary(&user).await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

/// Create a lead
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = CreateLeadDto,
    responses(
        (status = 201, description = "Lead created", body = ApiResponse<LeadResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_lead(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
    AppJson(dto): AppJson<CreateLeadDto>,
) -> Result<(StatusCode, Json<ApiResponse<LeadResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let lead = service.create(dto, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(lead), None, None)),
    ))
}

/// Get lead by id
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    params(
        ("id" = String, Path, description = "Lead id")
    ),
    responses(
        (status = 200, description = "Lead found", body = ApiResponse<LeadResponseDto>),
        (status = 403, description = "Forbidden - Staff access required"),
        (status = 404, description = "Lead not found")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_lead(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LeadResponseDto>>> {
    let lead = service.get(&id, &user).await?;
    Ok(Json(ApiResponse::success(Some(lead), None, None)))
}

/// Update a lead
#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    params(
        ("id" = String, Path, description = "Lead id")
    ),
    request_body = UpdateLeadDto,
    responses(
        (status = 200, description = "Lead updated", body = ApiResponse<LeadResponseDto>),
        (status = 400, description = "Validation error or empty body"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Lead not found")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_lead(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdateLeadDto>,
) -> Result<Json<ApiResponse<LeadResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if dto.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let lead = service.update(&id, dto, &user).await?;
    Ok(Json(ApiResponse::success(Some(lead), None, None)))
}

/// Delete a lead
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    params(
        ("id" = String, Path, description = "Lead id")
    ),
    responses(
        (status = 200, description = "Lead deleted"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Lead not found")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_lead(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<LeadService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Lead deleted".to_string()),
        None,
    )))
}

/// Activity log of a lead, newest first
#[utoipa::path(
    get,
    path = "/api/leads/{id}/logs",
    params(
        ("id" = String, Path, description = "Lead id")
    ),
    responses(
        (status = 200, description = "Lead activity", body = ApiResponse<Vec<LeadLogResponseDto>>),
        (status = 404, description = "Lead not found")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_lead_logs(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<LeadLogResponseDto>>>> {
    let logs = service.list_logs(&id, &user).await?;
    let total = logs.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(logs),
        None,
        Some(Meta { total }),
    )))
}

/// Record activity on a lead
#[utoipa::path(
    post,
    path = "/api/leads/{id}/logs",
    params(
        ("id" = String, Path, description = "Lead id")
    ),
    request_body = CreateLeadLogDto,
    responses(
        (status = 201, description = "Log added", body = ApiResponse<LeadLogResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Lead not found")
    ),
    tag = "leads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_lead_log(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<LeadService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<CreateLeadLogDto>,
) -> Result<(StatusCode, Json<ApiResponse<LeadLogResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let log = service.add_log(&id, dto, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(log), None, None)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::leads::routes;
    use crate::shared::test_helpers::{create_admin, create_staff, create_student, test_pool, with_user};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn service() -> Arc<LeadService> {
        Arc::new(LeadService::new(test_pool().await))
    }

    fn server_as(service: &Arc<LeadService>, user: AuthenticatedUser) -> TestServer {
        let app = with_user(routes::routes(Arc::clone(service)), user);
        TestServer::new(app).unwrap()
    }

    async fn post_lead(server: &TestServer, name: &str) -> Value {
        let response = server
            .post("/api/leads")
            .json(&json!({
                "name": name,
                "phone": "555-0100",
                "email": "",
                "country": "Ireland",
                "assignmentType": "Essay",
                "potentialIncome": 250.0,
                "status": "NEW",
                "assignedTo": "",
                "assignedName": ""
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["data"].clone()
    }

    #[tokio::test]
    async fn test_staff_creates_and_lists_leads() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));

        let lead = post_lead(&server, "Sophia").await;
        assert_eq!(lead["assignedTo"], "stf_1");
        assert_eq!(lead["potentialIncome"], 250.0);

        let response = server.get("/api/leads").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["name"], "Sophia");
    }

    #[tokio::test]
    async fn test_empty_filters_are_ignored() {
        let service = service().await;
        post_lead(&server_as(&service, create_staff("stf_1")), "Sophia").await;
        post_lead(&server_as(&service, create_staff("stf_2")), "Lucas").await;

        let response = server_as(&service, create_admin("adm_1"))
            .get("/api/leads?assignedTo=&status=")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["meta"]["total"], 2);
    }

    #[tokio::test]
    async fn test_huge_income_is_rejected() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));

        server
            .post("/api/leads")
            .json(&json!({ "name": "Whale", "potentialIncome": 7.9e28 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_students_have_no_crm_access() {
        let service = service().await;
        let server = server_as(&service, create_student("std_1"));

        server
            .get("/api/leads")
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/leads/summary")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_patch_ignores_server_fields() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));
        let lead = post_lead(&server, "Lucas").await;
        let id = lead["id"].as_str().unwrap().to_string();

        let response = server
            .patch(&format!("/api/leads/{}", id))
            .json(&json!({
                "id": "something-else",
                "createdAt": "2020-01-01T00:00:00Z",
                "status": "FOLLOWUP"
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["status"], "FOLLOWUP");
        assert_eq!(body["data"]["createdAt"], lead["createdAt"]);

        server
            .patch(&format!("/api/leads/{}", id))
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_staff_cannot_touch_foreign_lead() {
        let service = service().await;
        let owner = server_as(&service, create_staff("stf_1"));
        let lead = post_lead(&owner, "Isla").await;
        let id = lead["id"].as_str().unwrap();

        let other = server_as(&service, create_staff("stf_2"));
        other
            .get(&format!("/api/leads/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        other
            .patch(&format!("/api/leads/{}", id))
            .json(&json!({ "status": "LOST" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_only_admin_deletes() {
        let service = service().await;
        let staff = server_as(&service, create_staff("stf_1"));
        let lead = post_lead(&staff, "Jack").await;
        let path = format!("/api/leads/{}", lead["id"].as_str().unwrap());

        staff.delete(&path).await.assert_status(StatusCode::FORBIDDEN);

        let admin = server_as(&service, create_admin("adm_1"));
        admin.delete(&path).await.assert_status_ok();
        admin.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logs_over_http() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));
        let lead = post_lead(&server, "Grace").await;
        let path = format!("/api/leads/{}/logs", lead["id"].as_str().unwrap());

        server
            .post(&path)
            .json(&json!({ "action": "CALL", "content": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post(&path)
            .json(&json!({ "action": "CALL", "content": "Left a voicemail" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get(&path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"][0]["action"], "CALL");
        assert_eq!(body["data"][0]["userId"], "stf_1");

        server
            .post("/api/leads/missing/logs")
            .json(&json!({ "content": "hello" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summary_route() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));
        post_lead(&server, "Ella").await;
        post_lead(&server, "Finn").await;

        let response = server.get("/api/leads/summary").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["total"], 2);
        assert_eq!(body["data"]["totalPotentialIncome"], 500.0);
    }
}
