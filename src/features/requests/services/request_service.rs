use chrono::Utc;
use sqlx::SqlitePool;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::requests::dtos::{
    CreateRequestDto, ListRequestsQuery, RequestResponseDto, RequestStatsDto, SubmitWorkDto,
    UpdateRequestDto, VerifyRequestDto,
};
use crate::features::requests::models::{AssignmentRequest, RequestStatus};
use crate::shared::constants::{REQUEST_ID_DIGITS, REQUEST_ID_PREFIX};

const REQUEST_COLUMNS: &str = "id, title, description, type, status, student_id, student_name, \
     assigned_to, assigned_name, created_at, completed_at, verified_at, comments, \
     plagiarism_score, ai_score, report_url, work_content, attachments, is_paid";

/// Service for assignment requests and their workflow
pub struct RequestService {
    pool: SqlitePool,
}

impl RequestService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List requests matching all given filters, newest first
    pub async fn list(&self, filter: &ListRequestsQuery) -> Result<Vec<RequestResponseDto>> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM requests
            WHERE (?1 IS NULL OR student_id = ?1)
              AND (?2 IS NULL OR assigned_to = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY created_at DESC, id DESC
            "#
        );

        let rows = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(&filter.student_id)
            .bind(&filter.assigned_to)
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list requests: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Work visible to a staff member: their own assignments plus
    /// everything waiting to be claimed or reworked
    pub async fn staff_queue(&self, staff_id: &str) -> Result<Vec<RequestResponseDto>> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM requests
            WHERE assigned_to = ?1
               OR status IN ('PENDING_ASSIGNMENT', 'REJECTED')
            ORDER BY created_at DESC, id DESC
            "#
        );

        let rows = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(staff_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load staff queue: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn find(&self, id: &str) -> Result<Option<AssignmentRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1");

        sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get request: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_or_404(&self, id: &str) -> Result<AssignmentRequest> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request '{}' not found", id)))
    }

    /// Fetch a request as seen by the caller. Students only see their own.
    pub async fn get_for(&self, id: &str, user: &AuthenticatedUser) -> Result<RequestResponseDto> {
        let request = self.find_or_404(id).await?;

        if user.is_student() && request.student_id != user.user_id {
            return Err(AppError::NotFound(format!("Request '{}' not found", id)));
        }

        Ok(request.into())
    }

    /// Create a request owned by the student. The id is the next number in
    /// the `REQ-` sequence, allocated in the same statement as the insert.
    pub async fn create(
        &self,
        dto: CreateRequestDto,
        student: &AuthenticatedUser,
    ) -> Result<RequestResponseDto> {
        let prefix_len = REQUEST_ID_PREFIX.len();
        let sql = format!(
            r#"
            INSERT INTO requests (id, title, description, type, status, student_id, student_name, created_at, is_paid)
            SELECT
                printf('{REQUEST_ID_PREFIX}%0{REQUEST_ID_DIGITS}d',
                       COALESCE(MAX(CAST(substr(id, {start}) AS INTEGER)), 0) + 1),
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, 0
            FROM requests
            WHERE id LIKE '{REQUEST_ID_PREFIX}%'
            RETURNING {REQUEST_COLUMNS}
            "#,
            start = prefix_len + 1,
        );

        let request = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.request_type)
            .bind(RequestStatus::PendingAssignment)
            .bind(&student.user_id)
            .bind(&student.name)
            .bind(Utc::now().date_naive())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create request: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Request created: id={}, student_id={}, type={}",
            request.id,
            request.student_id,
            request.request_type
        );

        Ok(request.into())
    }

    /// Generic field-level update (last write wins, no workflow checks)
    pub async fn update(&self, id: &str, dto: UpdateRequestDto) -> Result<RequestResponseDto> {
        let attachments = dto
            .attachments
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Failed to encode attachments: {}", e)))?;

        let sql = format!(
            r#"
            UPDATE requests
            SET title = COALESCE(?1, title),
                description = COALESCE(?2, description),
                type = COALESCE(?3, type),
                status = COALESCE(?4, status),
                assigned_to = COALESCE(?5, assigned_to),
                assigned_name = COALESCE(?6, assigned_name),
                completed_at = COALESCE(?7, completed_at),
                verified_at = COALESCE(?8, verified_at),
                comments = COALESCE(?9, comments),
                plagiarism_score = COALESCE(?10, plagiarism_score),
                ai_score = COALESCE(?11, ai_score),
                report_url = COALESCE(?12, report_url),
                work_content = COALESCE(?13, work_content),
                attachments = COALESCE(?14, attachments),
                is_paid = COALESCE(?15, is_paid)
            WHERE id = ?16
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.request_type)
            .bind(dto.status)
            .bind(&dto.assigned_to)
            .bind(&dto.assigned_name)
            .bind(dto.completed_at)
            .bind(dto.verified_at)
            .bind(&dto.comments)
            .bind(dto.plagiarism_score)
            .bind(dto.ai_score)
            .bind(&dto.report_url)
            .bind(&dto.work_content)
            .bind(attachments)
            .bind(dto.is_paid)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update request: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Request '{}' not found", id)))?;

        tracing::info!("Request updated: id={}, status={}", request.id, request.status);
        Ok(request.into())
    }

    /// Staff takes an unassigned request
    pub async fn claim(&self, id: &str, staff: &AuthenticatedUser) -> Result<RequestResponseDto> {
        let sql = format!(
            r#"
            UPDATE requests
            SET status = ?1, assigned_to = ?2, assigned_name = ?3
            WHERE id = ?4 AND status = ?5
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let claimed = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(RequestStatus::InProgress)
            .bind(&staff.user_id)
            .bind(&staff.name)
            .bind(id)
            .bind(RequestStatus::PendingAssignment)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to claim request: {:?}", e);
                AppError::Database(e)
            })?;

        match claimed {
            Some(request) => {
                tracing::info!("Request claimed: id={}, staff_id={}", request.id, staff.user_id);
                Ok(request.into())
            }
            None => {
                let current = self.find_or_404(id).await?;
                Err(AppError::Conflict(format!(
                    "Request '{}' cannot be claimed while {}",
                    id, current.status
                )))
            }
        }
    }

    /// Hand in work for review. Only the assignee (or an admin) may submit.
    pub async fn submit_work(
        &self,
        id: &str,
        user: &AuthenticatedUser,
        dto: SubmitWorkDto,
    ) -> Result<RequestResponseDto> {
        let current = self.find_or_404(id).await?;

        if !user.is_admin() && current.assigned_to.as_deref() != Some(user.user_id.as_str()) {
            return Err(AppError::Forbidden(
                "Only the assigned staff member can submit work".to_string(),
            ));
        }

        self.ensure_transition(&current, RequestStatus::UnderReview)?;

        let attachments = serde_json::to_string(&dto.attachments)
            .map_err(|e| AppError::Internal(format!("Failed to encode attachments: {}", e)))?;

        let sql = format!(
            r#"
            UPDATE requests
            SET status = ?1, work_content = ?2, attachments = ?3, completed_at = ?4
            WHERE id = ?5 AND status = ?6
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(RequestStatus::UnderReview)
            .bind(&dto.work_content)
            .bind(attachments)
            .bind(Utc::now().date_naive())
            .bind(id)
            .bind(current.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to submit work: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| concurrent_change(id))?;

        tracing::info!("Work submitted: id={}, by={}", request.id, user.user_id);
        Ok(request.into())
    }

    /// Approve or reject work under review
    pub async fn verify(&self, id: &str, dto: VerifyRequestDto) -> Result<RequestResponseDto> {
        let current = self.find_or_404(id).await?;

        let next = if dto.approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        self.ensure_transition(&current, next)?;

        let verified_at = dto.approved.then(|| Utc::now().date_naive());

        let sql = format!(
            r#"
            UPDATE requests
            SET status = ?1,
                comments = COALESCE(?2, comments),
                plagiarism_score = COALESCE(?3, plagiarism_score),
                ai_score = COALESCE(?4, ai_score),
                report_url = COALESCE(?5, report_url),
                verified_at = COALESCE(?6, verified_at)
            WHERE id = ?7 AND status = ?8
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, AssignmentRequest>(&sql)
            .bind(next)
            .bind(&dto.comments)
            .bind(dto.plagiarism_score)
            .bind(dto.ai_score)
            .bind(&dto.report_url)
            .bind(verified_at)
            .bind(id)
            .bind(current.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to verify request: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| concurrent_change(id))?;

        tracing::info!("Request verified: id={}, status={}", request.id, request.status);
        Ok(request.into())
    }

    /// Record payment. Students may only pay for their own requests.
    pub async fn mark_paid(&self, id: &str, user: &AuthenticatedUser) -> Result<RequestResponseDto> {
        let current = self.find_or_404(id).await?;

        let allowed = user.is_admin() || (user.is_student() && current.student_id == user.user_id);
        if !allowed {
            return Err(AppError::Forbidden(
                "Only the requesting student can pay for this request".to_string(),
            ));
        }

        if current.is_paid {
            return Ok(current.into());
        }

        self.update(
            id,
            UpdateRequestDto {
                is_paid: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    /// Counts for the portal header, optionally for one student
    pub async fn stats(&self, student_id: Option<&str>) -> Result<RequestStatsDto> {
        let (total, completed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'APPROVED' THEN 1 ELSE 0 END), 0)
            FROM requests
            WHERE (?1 IS NULL OR student_id = ?1)
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute request stats: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(RequestStatsDto {
            total,
            in_progress: total - completed,
            completed,
        })
    }

    fn ensure_transition(&self, request: &AssignmentRequest, next: RequestStatus) -> Result<()> {
        if request.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "Request '{}' cannot move from {} to {}",
                request.id, request.status, next
            )))
        }
    }
}

fn concurrent_change(id: &str) -> AppError {
    AppError::Conflict(format!(
        "Request '{}' was modified by someone else, reload and try again",
        id
    ))
}
