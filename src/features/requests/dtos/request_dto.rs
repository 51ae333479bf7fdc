use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::requests::models::{AssignmentRequest, RequestStatus};
use crate::shared::types::empty_as_none;

/// Response DTO for an assignment request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponseDto {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub request_type: String,
    pub status: RequestStatus,
    pub student_id: String,
    pub student_name: String,
    pub assigned_to: Option<String>,
    pub assigned_name: Option<String>,
    pub created_at: NaiveDate,
    pub completed_at: Option<NaiveDate>,
    pub verified_at: Option<NaiveDate>,
    pub comments: Option<String>,
    pub plagiarism_score: Option<i64>,
    pub ai_score: Option<i64>,
    pub report_url: Option<String>,
    pub work_content: Option<String>,
    pub attachments: Vec<String>,
    pub is_paid: bool,
}

impl From<AssignmentRequest> for RequestResponseDto {
    fn from(r: AssignmentRequest) -> Self {
        let attachments = r.attachment_list();
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            request_type: r.request_type,
            status: r.status,
            student_id: r.student_id,
            student_name: r.student_name,
            assigned_to: r.assigned_to,
            assigned_name: r.assigned_name,
            created_at: r.created_at,
            completed_at: r.completed_at,
            verified_at: r.verified_at,
            comments: r.comments,
            plagiarism_score: r.plagiarism_score,
            ai_score: r.ai_score,
            report_url: r.report_url,
            work_content: r.work_content,
            attachments,
            is_paid: r.is_paid,
        }
    }
}

/// Request DTO for a new assignment request (student)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRequestDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must not exceed 10000 characters"))]
    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 100, message = "Type must be 1-100 characters"))]
    #[serde(rename = "type")]
    pub request_type: String,
}

/// Generic field-level update. Absent fields are left unchanged;
/// status changes made here are not checked against the workflow.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub request_type: Option<String>,
    pub status: Option<RequestStatus>,
    pub assigned_to: Option<String>,
    pub assigned_name: Option<String>,
    pub completed_at: Option<NaiveDate>,
    pub verified_at: Option<NaiveDate>,
    pub comments: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Plagiarism score must be 0-100"))]
    pub plagiarism_score: Option<i64>,
    #[validate(range(min = 0, max = 100, message = "AI score must be 0-100"))]
    pub ai_score: Option<i64>,
    pub report_url: Option<String>,
    pub work_content: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub is_paid: Option<bool>,
}

impl UpdateRequestDto {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.request_type.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.assigned_name.is_none()
            && self.completed_at.is_none()
            && self.verified_at.is_none()
            && self.comments.is_none()
            && self.plagiarism_score.is_none()
            && self.ai_score.is_none()
            && self.report_url.is_none()
            && self.work_content.is_none()
            && self.attachments.is_none()
            && self.is_paid.is_none()
    }
}

/// Staff hand-in of finished work
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkDto {
    #[validate(length(min = 1, message = "Work content is required"))]
    pub work_content: String,

    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Admin review decision
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequestDto {
    pub approved: bool,

    #[validate(length(max = 5000, message = "Comments must not exceed 5000 characters"))]
    pub comments: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Plagiarism score must be 0-100"))]
    pub plagiarism_score: Option<i64>,

    #[validate(range(min = 0, max = 100, message = "AI score must be 0-100"))]
    pub ai_score: Option<i64>,

    #[validate(url(message = "Report URL must be a valid URL"))]
    pub report_url: Option<String>,
}

/// Query params for listing requests (filters are AND-combined).
/// Empty values such as `?status=` are ignored.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListRequestsQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<RequestStatus>,
}

/// Portal counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatsDto {
    pub total: i64,
    /// Everything not yet approved
    pub in_progress: i64,
    /// Approved requests
    pub completed: i64,
}
