use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

/// Request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    PendingAssignment,
    InProgress,
    UnderReview,
    Rejected,
    Approved,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::PendingAssignment => "PENDING_ASSIGNMENT",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::UnderReview => "UNDER_REVIEW",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Approved => "APPROVED",
        }
    }

    /// Transitions allowed through the workflow actions (claim, submit, verify).
    /// Generic field updates bypass this check.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;

        matches!(
            (self, next),
            (PendingAssignment, InProgress)
                | (InProgress, UnderReview)
                | (Rejected, UnderReview)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database model for an assignment request
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "type")]
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
    /// JSON array of attachment filenames
    pub attachments: Option<String>,
    pub is_paid: bool,
}

impl AssignmentRequest {
    pub fn attachment_list(&self) -> Vec<String> {
        self.attachments
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}
