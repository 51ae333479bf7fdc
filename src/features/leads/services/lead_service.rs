use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::leads::dtos::{
    CreateLeadDto, CreateLeadLogDto, LeadLogResponseDto, LeadResponseDto, LeadStatusCount,
    LeadSummaryDto, ListLeadsQuery, UpdateLeadDto,
};
use crate::features::leads::models::{Lead, LeadLog, LeadStatus};
use crate::shared::money::{cents_to_decimal, decimal_to_cents};

const LEAD_COLUMNS: &str = "id, name, phone, email, country, assignment_type, \
     potential_income_cents, status, assigned_to, assigned_name, created_at, updated_at";

/// Forms post empty strings for cleared optional inputs
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Service for CRM leads and their activity logs.
///
/// Staff only ever see leads assigned to them; admins see everything.
pub struct LeadService {
    pool: SqlitePool,
}

impl LeadService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Assignee filter implied by the caller's role
    fn scope<'a>(caller: &'a AuthenticatedUser, requested: Option<&'a str>) -> Option<&'a str> {
        if caller.is_admin() {
            requested
        } else {
            Some(caller.user_id.as_str())
        }
    }

    pub async fn list(
        &self,
        filter: &ListLeadsQuery,
        caller: &AuthenticatedUser,
    ) -> Result<Vec<LeadResponseDto>> {
        let assigned_to = Self::scope(caller, filter.assigned_to.as_deref());

        let sql = format!(
            r#"
            SELECT {LEAD_COLUMNS}
            FROM leads
            WHERE (?1 IS NULL OR assigned_to = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, id DESC
            "#
        );

        let leads = sqlx::query_as::<_, Lead>(&sql)
            .bind(assigned_to)
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list leads: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(leads.into_iter().map(|l| l.into()).collect())
    }

    /// Load a lead the caller may work on. Leads owned by someone else look
    /// the same as missing ones to staff.
    async fn find_visible(&self, id: &str, caller: &AuthenticatedUser) -> Result<Lead> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1");

        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get lead: {:?}", e);
                AppError::Database(e)
            })?
            .filter(|lead| caller.is_admin() || lead.is_assigned_to(&caller.user_id));

        lead.ok_or_else(|| AppError::NotFound(format!("Lead '{}' not found", id)))
    }

    pub async fn get(&self, id: &str, caller: &AuthenticatedUser) -> Result<LeadResponseDto> {
        self.find_visible(id, caller).await.map(|l| l.into())
    }

    pub async fn create(
        &self,
        dto: CreateLeadDto,
        caller: &AuthenticatedUser,
    ) -> Result<LeadResponseDto> {
        let (assigned_to, assigned_name) = if caller.is_admin() {
            (non_empty(dto.assigned_to), non_empty(dto.assigned_name))
        } else {
            (Some(caller.user_id.clone()), Some(caller.name.clone()))
        };

        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let sql = format!(
            r#"
            INSERT INTO leads ({LEAD_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                    COALESCE(?10, (SELECT name FROM users WHERE id = ?9)), ?11, ?11)
            RETURNING {LEAD_COLUMNS}
            "#
        );

        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(&id)
            .bind(&dto.name)
            .bind(non_empty(dto.phone))
            .bind(non_empty(dto.email))
            .bind(non_empty(dto.country))
            .bind(&dto.assignment_type)
            .bind(decimal_to_cents(dto.potential_income)?)
            .bind(dto.status.unwrap_or(LeadStatus::New))
            .bind(&assigned_to)
            .bind(&assigned_name)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create lead: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Lead created: id={}, assigned_to={:?}, by={}",
            lead.id,
            lead.assigned_to,
            caller.user_id
        );

        Ok(lead.into())
    }

    /// Apply a partial update. Reassigning without `assignedName` takes the
    /// new assignee's name from their user record.
    pub async fn update(
        &self,
        id: &str,
        dto: UpdateLeadDto,
        caller: &AuthenticatedUser,
    ) -> Result<LeadResponseDto> {
        self.find_visible(id, caller).await?;

        let assigned_to = non_empty(dto.assigned_to);
        if !caller.is_admin() {
            if let Some(ref target) = assigned_to {
                if target != &caller.user_id {
                    return Err(AppError::Forbidden(
                        "Only admins can reassign leads".to_string(),
                    ));
                }
            }
        }

        let potential_income_cents = dto.potential_income.map(decimal_to_cents).transpose()?;

        let sql = format!(
            r#"
            UPDATE leads
            SET name = COALESCE(?1, name),
                phone = COALESCE(?2, phone),
                email = COALESCE(?3, email),
                country = COALESCE(?4, country),
                assignment_type = COALESCE(?5, assignment_type),
                potential_income_cents = COALESCE(?6, potential_income_cents),
                status = COALESCE(?7, status),
                assigned_to = COALESCE(?8, assigned_to),
                assigned_name = CASE
                    WHEN ?9 IS NOT NULL THEN ?9
                    WHEN ?8 IS NOT NULL AND ?8 IS NOT assigned_to
                        THEN (SELECT name FROM users WHERE id = ?8)
                    ELSE assigned_name
                END,
                updated_at = ?10
            WHERE id = ?11
            RETURNING {LEAD_COLUMNS}
            "#
        );

        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(&dto.name)
            .bind(non_empty(dto.phone))
            .bind(non_empty(dto.email))
            .bind(non_empty(dto.country))
            .bind(&dto.assignment_type)
            .bind(potential_income_cents)
            .bind(dto.status)
            .bind(&assigned_to)
            .bind(non_empty(dto.assigned_name))
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update lead: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Lead '{}' not found", id)))?;

        tracing::info!("Lead updated: id={}, status={}", lead.id, lead.status);
        Ok(lead.into())
    }

    /// Delete a lead. Its logs are kept.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete lead: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead '{}' not found", id)));
        }

        tracing::info!("Lead deleted: id={}", id);
        Ok(())
    }

    pub async fn summary(&self, caller: &AuthenticatedUser) -> Result<LeadSummaryDto> {
        let assigned_to = Self::scope(caller, None);

        let rows: Vec<(LeadStatus, i64, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(potential_income_cents), 0)
            FROM leads
            WHERE (?1 IS NULL OR assigned_to = ?1)
            GROUP BY status
            "#,
        )
        .bind(assigned_to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to summarize leads: {:?}", e);
            AppError::Database(e)
        })?;

        let by_status = LeadStatus::ALL
            .iter()
            .map(|&status| LeadStatusCount {
                status,
                count: rows
                    .iter()
                    .find(|(s, _, _)| *s == status)
                    .map(|(_, count, _)| *count)
                    .unwrap_or(0),
            })
            .collect();

        let total = rows.iter().map(|(_, count, _)| count).sum();
        let income_cents = rows.iter().map(|(_, _, cents)| cents).sum();

        Ok(LeadSummaryDto {
            total,
            by_status,
            total_potential_income: cents_to_decimal(income_cents),
        })
    }

    /// Activity for a lead, newest first
    pub async fn list_logs(
        &self,
        lead_id: &str,
        caller: &AuthenticatedUser,
    ) -> Result<Vec<LeadLogResponseDto>> {
        self.find_visible(lead_id, caller).await?;

        let logs = sqlx::query_as::<_, LeadLog>(
            r#"
            SELECT id, lead_id, user_id, user_name, action, content, created_at
            FROM lead_logs
            WHERE lead_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list lead logs: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(logs.into_iter().map(|l| l.into()).collect())
    }

    pub async fn add_log(
        &self,
        lead_id: &str,
        dto: CreateLeadLogDto,
        caller: &AuthenticatedUser,
    ) -> Result<LeadLogResponseDto> {
        self.find_visible(lead_id, caller).await?;

        let log = sqlx::query_as::<_, LeadLog>(
            r#"
            INSERT INTO lead_logs (id, lead_id, user_id, user_name, action, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, lead_id, user_id, user_name, action, content, created_at
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(lead_id)
        .bind(&caller.user_id)
        .bind(&caller.name)
        .bind(dto.action)
        .bind(&dto.content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add lead log: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Lead log added: lead_id={}, by={}", lead_id, caller.user_id);
        Ok(log.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::leads::models::LeadLogAction;
    use crate::features::users::dtos::CreateUserDto;
    use crate::features::users::models::UserRole;
    use crate::features::users::services::UserService;
    use crate::shared::test_helpers::{create_admin, create_staff, test_pool};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn lead(name: &str, income: &str) -> CreateLeadDto {
        CreateLeadDto {
            name: name.to_string(),
            phone: Some("+44 7700 900123".to_string()),
            email: Some(String::new()),
            country: Some("UK".to_string()),
            assignment_type: "Dissertation".to_string(),
            potential_income: Decimal::from_str(income).unwrap(),
            status: None,
            assigned_to: None,
            assigned_name: None,
        }
    }

    #[tokio::test]
    async fn test_staff_create_is_self_assigned() {
        let service = LeadService::new(test_pool().await);
        let staff = create_staff("stf_1");

        let mut dto = lead("Emma", "1200.50");
        dto.assigned_to = Some("stf_2".to_string());
        let created = service.create(dto, &staff).await.unwrap();

        assert_eq!(created.assigned_to.as_deref(), Some("stf_1"));
        assert_eq!(created.assigned_name.as_deref(), Some(staff.name.as_str()));
        assert_eq!(created.status, LeadStatus::New);
        assert_eq!(created.potential_income.to_string(), "1200.50");
        assert!(created.email.is_none());
    }

    #[tokio::test]
    async fn test_admin_may_leave_lead_unassigned() {
        let service = LeadService::new(test_pool().await);

        let mut dto = lead("Liam", "0");
        dto.assigned_to = Some(String::new());
        let created = service.create(dto, &create_admin("adm_1")).await.unwrap();

        assert!(created.assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_reassignment_refreshes_assignee_name() {
        let pool = test_pool().await;
        let service = LeadService::new(pool.clone());
        let users = UserService::new(pool);
        let admin = create_admin("adm_1");

        let writer = users
            .create(CreateUserDto {
                name: "Bob Writer".to_string(),
                username: "bob_writer".to_string(),
                email: None,
                password: "password123".to_string(),
                role: UserRole::Staff,
            })
            .await
            .unwrap();

        let created = service
            .create(lead("Olivia", "300"), &create_staff("stf_1"))
            .await
            .unwrap();

        let moved = service
            .update(
                &created.id,
                UpdateLeadDto {
                    assigned_to: Some(writer.id.clone()),
                    ..Default::default()
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(moved.assigned_to.as_deref(), Some(writer.id.as_str()));
        assert_eq!(moved.assigned_name.as_deref(), Some("Bob Writer"));

        let orphaned = service
            .update(
                &created.id,
                UpdateLeadDto {
                    assigned_to: Some("usr_gone".to_string()),
                    ..Default::default()
                },
                &admin,
            )
            .await
            .unwrap();
        assert!(orphaned.assigned_name.is_none());

        let renamed = service
            .update(
                &created.id,
                UpdateLeadDto {
                    assigned_name: Some("Someone Else".to_string()),
                    ..Default::default()
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(renamed.assigned_to.as_deref(), Some("usr_gone"));
        assert_eq!(renamed.assigned_name.as_deref(), Some("Someone Else"));
    }

    #[tokio::test]
    async fn test_admin_assignment_looks_up_name() {
        let pool = test_pool().await;
        let service = LeadService::new(pool.clone());
        let users = UserService::new(pool);
        let writer = users
            .create(CreateUserDto {
                name: "Jane Staff".to_string(),
                username: "jane_staff".to_string(),
                email: None,
                password: "password123".to_string(),
                role: UserRole::Staff,
            })
            .await
            .unwrap();

        let mut dto = lead("Noah", "50");
        dto.assigned_to = Some(writer.id.clone());
        let created = service.create(dto, &create_admin("adm_1")).await.unwrap();

        assert_eq!(created.assigned_name.as_deref(), Some("Jane Staff"));
    }

    #[tokio::test]
    async fn test_staff_only_see_own_leads() {
        let service = LeadService::new(test_pool().await);
        let alice = create_staff("stf_1");
        let bob = create_staff("stf_2");
        let admin = create_admin("adm_1");

        let mine = service.create(lead("Mine", "100"), &alice).await.unwrap();
        let theirs = service.create(lead("Theirs", "200"), &bob).await.unwrap();

        let visible = service
            .list(
                &ListLeadsQuery {
                    assigned_to: Some("stf_2".to_string()),
                    status: None,
                },
                &alice,
            )
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, mine.id);

        let err = service.get(&theirs.id, &alice).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let all = service.list(&ListLeadsQuery::default(), &admin).await.unwrap();
        assert_eq!(all.len(), 2);
        // newest first
        assert_eq!(all[0].id, theirs.id);

        let filtered = service
            .list(
                &ListLeadsQuery {
                    assigned_to: Some("stf_2".to_string()),
                    status: None,
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, theirs.id);
    }

    #[tokio::test]
    async fn test_update_moves_through_funnel() {
        let service = LeadService::new(test_pool().await);
        let staff = create_staff("stf_1");
        let created = service.create(lead("Noah", "300"), &staff).await.unwrap();

        let updated = service
            .update(
                &created.id,
                UpdateLeadDto {
                    status: Some(LeadStatus::Contacted),
                    potential_income: Some(Decimal::from_str("450").unwrap()),
                    ..Default::default()
                },
                &staff,
            )
            .await
            .unwrap();

        assert_eq!(updated.status, LeadStatus::Contacted);
        assert_eq!(updated.potential_income.to_string(), "450.00");
        assert_eq!(updated.name, "Noah");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_staff_cannot_reassign() {
        let service = LeadService::new(test_pool().await);
        let staff = create_staff("stf_1");
        let created = service.create(lead("Olivia", "300"), &staff).await.unwrap();

        let err = service
            .update(
                &created.id,
                UpdateLeadDto {
                    assigned_to: Some("stf_2".to_string()),
                    ..Default::default()
                },
                &staff,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let reassigned = service
            .update(
                &created.id,
                UpdateLeadDto {
                    assigned_to: Some("stf_2".to_string()),
                    assigned_name: Some("Bob".to_string()),
                    ..Default::default()
                },
                &create_admin("adm_1"),
            )
            .await
            .unwrap();
        assert_eq!(reassigned.assigned_to.as_deref(), Some("stf_2"));
    }

    #[tokio::test]
    async fn test_negative_income_rejected() {
        let service = LeadService::new(test_pool().await);
        let err = service
            .create(lead("Mia", "-5"), &create_staff("stf_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_summary_counts_every_status() {
        let service = LeadService::new(test_pool().await);
        let alice = create_staff("stf_1");
        let bob = create_staff("stf_2");

        service.create(lead("A", "100.25"), &alice).await.unwrap();
        let mut converted = lead("B", "200");
        converted.status = Some(LeadStatus::Converted);
        service.create(converted, &alice).await.unwrap();
        service.create(lead("C", "999"), &bob).await.unwrap();

        let summary = service.summary(&alice).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.total_potential_income.to_string(), "300.25");
        assert_eq!(summary.by_status.len(), 5);
        let count = |status| {
            summary
                .by_status
                .iter()
                .find(|c| c.status == status)
                .map(|c| c.count)
        };
        assert_eq!(count(LeadStatus::New), Some(1));
        assert_eq!(count(LeadStatus::Converted), Some(1));
        assert_eq!(count(LeadStatus::Lost), Some(0));

        let overall = service.summary(&create_admin("adm_1")).await.unwrap();
        assert_eq!(overall.total, 3);
    }

    #[tokio::test]
    async fn test_logs_newest_first_and_survive_delete() {
        let service = LeadService::new(test_pool().await);
        let staff = create_staff("stf_1");
        let admin = create_admin("adm_1");
        let created = service.create(lead("Ava", "100"), &staff).await.unwrap();

        service
            .add_log(
                &created.id,
                CreateLeadLogDto {
                    action: LeadLogAction::Call,
                    content: "Called, no answer".to_string(),
                },
                &staff,
            )
            .await
            .unwrap();
        let second = service
            .add_log(
                &created.id,
                CreateLeadLogDto {
                    action: LeadLogAction::Note,
                    content: "Prefers email".to_string(),
                },
                &staff,
            )
            .await
            .unwrap();

        assert_eq!(second.user_id, "stf_1");
        assert_eq!(second.user_name, staff.name);

        let logs = service.list_logs(&created.id, &staff).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, second.id);

        let err = service
            .list_logs(&created.id, &create_staff("stf_2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        service.delete(&created.id).await.unwrap();
        let orphaned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lead_logs WHERE lead_id = ?1")
                .bind(&created.id)
                .fetch_one(&service.pool)
                .await
                .unwrap();
        assert_eq!(orphaned, 2);

        let missing = service.delete(&created.id).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let err = service.get(&created.id, &admin).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
