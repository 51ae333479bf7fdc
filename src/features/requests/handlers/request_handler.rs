use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireAdmin, RequireStaff, RequireStudent};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::requests::dtos::{
    CreateRequestDto, ListRequestsQuery, RequestResponseDto, RequestStatsDto, SubmitWorkDto,
    UpdateRequestDto, VerifyRequestDto,
};
use crate::features::requests::services::RequestService;
use crate::shared::types::{ApiResponse, Meta};

/// List requests. Students only ever see their own.
#[utoipa::path(
    get,
    path = "/api/requests",
    params(ListRequestsQuery),
    responses(
        (status = 200, description = "List of requests", body = ApiResponse<Vec<RequestResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_requests(
    user: AuthenticatedUser,
    State(service): State<Arc<RequestService>>,
    AppQuery(mut query): AppQuery<ListRequestsQuery>,
) -> Result<Json<ApiResponse<Vec<RequestResponseDto>>>> {
    if user.is_student() {
        query.student_id = Some(user.user_id.clone());
    }

    let requests = service.list(&query).await?;
    let total = requests.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(requests),
        None,
        Some(Meta { total }),
    )))
}

/// Submit a new request
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequestDto,
    responses(
        (status = 201, description = "Request created", body = ApiResponse<RequestResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Student access required")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_request(
    RequireStudent(user): RequireStudent,
    State(service): State<Arc<RequestService>>,
    AppJson(dto): AppJson<CreateRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<RequestResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.create(dto, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(request),
            Some("Request submitted".to_string()),
            None,
        )),
    ))
}

/// Get request by id
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(
        ("id" = String, Path, description = "Request id, e.g. REQ-000001")
    ),
    responses(
        (status = 200, description = "Request found", body = ApiResponse<RequestResponseDto>),
        (status = 404, description = "Request not found")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_request(
    user: AuthenticatedUser,
    State(service): State<Arc<RequestService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestResponseDto>>> {
    let request = service.get_for(&id, &user).await?;
    Ok(Json(ApiResponse::success(Some(request), None, None)))
}

/// Update request fields
#[utoipa::path(
    patch,
    path = "/api/requests/{id}",
    params(
        ("id" = String, Path, description = "Request id")
    ),
    request_body = UpdateRequestDto,
    responses(
        (status = 200, description = "Request updated", body = ApiResponse<RequestResponseDto>),
        (status = 400, description = "Validation error or empty body"),
        (status = 403, description = "Forbidden - Staff access required"),
        (status = 404, description = "Request not found")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_request(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<RequestService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdateRequestDto>,
) -> Result<Json<ApiResponse<RequestResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if dto.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let request = service.update(&id, dto).await?;
    Ok(Json(ApiResponse::success(Some(request), None, None)))
}

/// Staff work queue
#[utoipa::path(
    get,
    path = "/api/requests/queue",
    responses(
        (status = 200, description = "Assigned, unclaimed and rejected requests", body = ApiResponse<Vec<RequestResponseDto>>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn staff_queue(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<RequestService>>,
) -> Result<Json<ApiResponse<Vec<RequestResponseDto>>>> {
    let requests = service.staff_queue(&user.user_id).await?;
    let total = requests.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(requests),
        None,
        Some(Meta { total }),
    )))
}

/// Request counters, scoped to the caller for students
#[utoipa::path(
    get,
    path = "/api/requests/stats",
    responses(
        (status = 200, description = "Request counters", body = ApiResponse<RequestStatsDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_stats(
    user: AuthenticatedUser,
    State(service): State<Arc<RequestService>>,
) -> Result<Json<ApiResponse<RequestStatsDto>>> {
    let scope = user.is_student().then_some(user.user_id.as_str());
    let stats = service.stats(scope).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Claim an unassigned request
#[utoipa::path(
    post,
    path = "/api/requests/{id}/claim",
    params(
        ("id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request claimed", body = ApiResponse<RequestResponseDto>),
        (status = 403, description = "Forbidden - Staff access required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not pending assignment")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn claim_request(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<RequestService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestResponseDto>>> {
    let request = service.claim(&id, &user).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Request claimed".to_string()),
        None,
    )))
}

/// Submit finished work for review
#[utoipa::path(
    post,
    path = "/api/requests/{id}/submit",
    params(
        ("id" = String, Path, description = "Request id")
    ),
    request_body = SubmitWorkDto,
    responses(
        (status = 200, description = "Work submitted", body = ApiResponse<RequestResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Invalid status transition")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn submit_work(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<RequestService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<SubmitWorkDto>,
) -> Result<Json<ApiResponse<RequestResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.submit_work(&id, &user, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Work submitted for review".to_string()),
        None,
    )))
}

/// Approve or reject submitted work
#[utoipa::path(
    post,
    path = "/api/requests/{id}/verify",
    params(
        ("id" = String, Path, description = "Request id")
    ),
    request_body = VerifyRequestDto,
    responses(
        (status = 200, description = "Review recorded", body = ApiResponse<RequestResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not under review")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_request(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<RequestService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<VerifyRequestDto>,
) -> Result<Json<ApiResponse<RequestResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.verify(&id, dto).await?;
    Ok(Json(ApiResponse::success(Some(request), None, None)))
}

/// Mark a request as paid
#[utoipa::path(
    post,
    path = "/api/requests/{id}/pay",
    params(
        ("id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<RequestResponseDto>),
        (status = 403, description = "Not the requesting student"),
        (status = 404, description = "Request not found")
    ),
    tag = "requests",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn pay_request(
    user: AuthenticatedUser,
    State(service): State<Arc<RequestService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestResponseDto>>> {
    let request = service.mark_paid(&id, &user).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Payment recorded".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::requests::routes;
    use crate::shared::test_helpers::{create_admin, create_staff, create_student, test_pool, with_user};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn service() -> Arc<RequestService> {
        Arc::new(RequestService::new(test_pool().await))
    }

    fn server_as(service: &Arc<RequestService>, user: AuthenticatedUser) -> TestServer {
        let app = with_user(routes::routes(Arc::clone(service)), user);
        TestServer::new(app).unwrap()
    }

    fn essay() -> CreateRequestDto {
        CreateRequestDto {
            title: "Research on Economics".to_string(),
            description: "Comparative analysis".to_string(),
            request_type: "Essay".to_string(),
        }
    }

    #[tokio::test]
    async fn test_student_creates_request() {
        let service = service().await;
        let server = server_as(&service, create_student("std_1"));

        let response = server
            .post("/api/requests")
            .json(&json!({
                "title": "Research on Economics",
                "description": "Comparative analysis",
                "type": "Essay"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["id"], "REQ-000001");
        assert_eq!(body["data"]["status"], "PENDING_ASSIGNMENT");
        assert_eq!(body["data"]["studentId"], "std_1");
        assert_eq!(body["data"]["isPaid"], false);
    }

    #[tokio::test]
    async fn test_staff_cannot_create_request() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));

        server
            .post("/api/requests")
            .json(&json!({ "title": "x", "type": "Essay" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_student_list_is_scoped_to_self() {
        let service = service().await;
        service.create(essay(), &create_student("std_1")).await.unwrap();
        service.create(essay(), &create_student("std_2")).await.unwrap();

        let server = server_as(&service, create_student("std_1"));
        let response = server
            .get("/api/requests")
            .add_query_param("studentId", "std_2")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["studentId"], "std_1");
    }

    #[tokio::test]
    async fn test_staff_list_filters_by_status() {
        let service = service().await;
        let student = create_student("std_1");
        let first = service.create(essay(), &student).await.unwrap();
        service.create(essay(), &student).await.unwrap();
        service.claim(&first.id, &create_staff("stf_1")).await.unwrap();

        let server = server_as(&service, create_staff("stf_1"));
        let response = server
            .get("/api/requests")
            .add_query_param("status", "IN_PROGRESS")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["id"], first.id);
    }

    #[tokio::test]
    async fn test_empty_filters_are_ignored() {
        let service = service().await;
        let first = service.create(essay(), &create_student("std_1")).await.unwrap();
        service.create(essay(), &create_student("std_2")).await.unwrap();
        service.claim(&first.id, &create_staff("stf_1")).await.unwrap();

        let server = server_as(&service, create_staff("stf_1"));
        let response = server.get("/api/requests?studentId=&assignedTo=&status=").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["meta"]["total"], 2);

        let response = server.get("/api/requests?studentId=&status=IN_PROGRESS").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_invalid_status_filter_is_bad_request() {
        let service = service().await;
        let server = server_as(&service, create_staff("stf_1"));

        server
            .get("/api/requests")
            .add_query_param("status", "DONE")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_student_cannot_read_foreign_request() {
        let service = service().await;
        let request = service.create(essay(), &create_student("std_2")).await.unwrap();

        let server = server_as(&service, create_student("std_1"));
        server
            .get(&format!("/api/requests/{}", request.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_rules() {
        let service = service().await;
        let request = service.create(essay(), &create_student("std_1")).await.unwrap();
        let server = server_as(&service, create_staff("stf_1"));

        server
            .patch(&format!("/api/requests/{}", request.id))
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .patch("/api/requests/REQ-999999")
            .json(&json!({ "comments": "hello" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let response = server
            .patch(&format!("/api/requests/{}", request.id))
            .json(&json!({ "status": "UNDER_REVIEW", "workContent": "Body" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "UNDER_REVIEW");
        assert_eq!(body["data"]["workContent"], "Body");
    }

    #[tokio::test]
    async fn test_student_cannot_patch() {
        let service = service().await;
        let request = service.create(essay(), &create_student("std_1")).await.unwrap();
        let server = server_as(&service, create_student("std_1"));

        server
            .patch(&format!("/api/requests/{}", request.id))
            .json(&json!({ "isPaid": true }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_workflow_over_http() {
        let service = service().await;
        let request = service.create(essay(), &create_student("std_1")).await.unwrap();
        let staff = server_as(&service, create_staff("stf_1"));
        let admin = server_as(&service, create_admin("adm_1"));

        staff
            .post(&format!("/api/requests/{}/claim", request.id))
            .await
            .assert_status_ok();

        staff
            .post(&format!("/api/requests/{}/claim", request.id))
            .await
            .assert_status(StatusCode::CONFLICT);

        staff
            .post(&format!("/api/requests/{}/submit", request.id))
            .json(&json!({ "workContent": "Final text", "attachments": ["essay.pdf"] }))
            .await
            .assert_status_ok();

        let response = admin
            .post(&format!("/api/requests/{}/verify", request.id))
            .json(&json!({
                "approved": true,
                "comments": "Verified and approved.",
                "plagiarismScore": 2,
                "aiScore": 5,
                "reportUrl": "https://lexora.example/report.pdf"
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "APPROVED");
        assert_eq!(body["data"]["attachments"][0], "essay.pdf");

        admin
            .post(&format!("/api/requests/{}/verify", request.id))
            .json(&json!({ "approved": false }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_verify_rejects_out_of_range_scores() {
        let service = service().await;
        let admin = server_as(&service, create_admin("adm_1"));

        admin
            .post("/api/requests/REQ-000001/verify")
            .json(&json!({ "approved": true, "plagiarismScore": 140 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_staff_cannot_verify() {
        let service = service().await;
        let staff = server_as(&service, create_staff("stf_1"));

        staff
            .post("/api/requests/REQ-000001/verify")
            .json(&json!({ "approved": true }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_owner_pays() {
        let service = service().await;
        let request = service.create(essay(), &create_student("std_1")).await.unwrap();

        server_as(&service, create_student("std_2"))
            .post(&format!("/api/requests/{}/pay", request.id))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server_as(&service, create_student("std_1"))
            .post(&format!("/api/requests/{}/pay", request.id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["isPaid"], true);
    }

    #[tokio::test]
    async fn test_queue_and_stats_routes() {
        let service = service().await;
        let student = create_student("std_1");
        service.create(essay(), &student).await.unwrap();
        service.create(essay(), &create_student("std_2")).await.unwrap();

        let response = server_as(&service, create_staff("stf_1"))
            .get("/api/requests/queue")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 2);

        let response = server_as(&service, student).get("/api/requests/stats").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["inProgress"], 1);
        assert_eq!(body["data"]["completed"], 0);

        server_as(&service, create_student("std_3"))
            .get("/api/requests/queue")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
