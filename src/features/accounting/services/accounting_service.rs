use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::core::error::{AppError, Result};
use crate::features::accounting::dtos::{
    CreateExpenseDto, ExpenseDto, FinancialSummaryDto, InvoiceDto,
};
use crate::features::accounting::models::{Expense, InvoiceStatus};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::requests::dtos::ListRequestsQuery;
use crate::features::requests::services::RequestService;
use crate::shared::constants::{EXPENSE_ID_DIGITS, EXPENSE_ID_PREFIX};
use crate::shared::money::{cents_to_decimal, decimal_to_cents};

/// Service for invoices (derived from requests) and expenses
pub struct AccountingService {
    pool: SqlitePool,
    requests: Arc<RequestService>,
}

impl AccountingService {
    pub fn new(pool: SqlitePool, requests: Arc<RequestService>) -> Self {
        Self { pool, requests }
    }

    /// Invoices visible to the caller. Students only see their own.
    pub async fn list_invoices(&self, caller: &AuthenticatedUser) -> Result<Vec<InvoiceDto>> {
        let filter = ListRequestsQuery {
            student_id: caller.is_student().then(|| caller.user_id.clone()),
            ..Default::default()
        };

        let requests = self.requests.list(&filter).await?;
        Ok(requests.iter().map(InvoiceDto::from).collect())
    }

    pub async fn list_expenses(&self) -> Result<Vec<ExpenseDto>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, type, recipient, amount_cents, date, created_at
            FROM expenses
            ORDER BY date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list expenses: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(expenses.into_iter().map(|e| e.into()).collect())
    }

    /// Record an expense under the next `EXP-` number
    pub async fn create_expense(&self, dto: CreateExpenseDto) -> Result<ExpenseDto> {
        let amount_cents = decimal_to_cents(dto.amount)?;
        let date = dto.date.unwrap_or_else(|| Utc::now().date_naive());

        let sql = format!(
            r#"
            INSERT INTO expenses (id, type, recipient, amount_cents, date, created_at)
            SELECT
                printf('{EXPENSE_ID_PREFIX}%0{EXPENSE_ID_DIGITS}d',
                       COALESCE(MAX(CAST(substr(id, {start}) AS INTEGER)), 0) + 1),
                ?1, ?2, ?3, ?4, ?5
            FROM expenses
            WHERE id LIKE '{EXPENSE_ID_PREFIX}%'
            RETURNING id, type, recipient, amount_cents, date, created_at
            "#,
            start = EXPENSE_ID_PREFIX.len() + 1,
        );

        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(&dto.expense_type)
            .bind(&dto.recipient)
            .bind(amount_cents)
            .bind(date)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create expense: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Expense recorded: id={}, type={}, amount_cents={}",
            expense.id,
            expense.expense_type,
            expense.amount_cents
        );

        Ok(expense.into())
    }

    pub async fn summary(&self, caller: &AuthenticatedUser) -> Result<FinancialSummaryDto> {
        let invoices = self.list_invoices(caller).await?;

        let (total_revenue, outstanding) = invoices.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(paid, pending), invoice| match invoice.status {
                InvoiceStatus::Paid => (paid + invoice.amount, pending),
                InvoiceStatus::Pending => (paid, pending + invoice.amount),
            },
        );

        let expense_cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM expenses")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to sum expenses: {:?}", e);
                    AppError::Database(e)
                })?;
        let total_expenses = cents_to_decimal(expense_cents);

        Ok(FinancialSummaryDto {
            total_revenue,
            outstanding,
            total_expenses,
            net_profit: total_revenue - total_expenses,
        })
    }
}
