use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::accounting::models::{
    invoice_amount_cents, invoice_id, Expense, InvoiceStatus,
};
use crate::features::requests::dtos::RequestResponseDto;
use crate::shared::money::cents_to_decimal;

/// Billing view of a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub request_id: String,
    pub student_id: String,
    pub student: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

impl From<&RequestResponseDto> for InvoiceDto {
    fn from(r: &RequestResponseDto) -> Self {
        Self {
            id: invoice_id(&r.id),
            request_id: r.id.clone(),
            student_id: r.student_id.clone(),
            student: r.student_name.clone(),
            description: r.title.clone(),
            amount: cents_to_decimal(invoice_amount_cents(&r.request_type)),
            status: r.is_paid.into(),
            date: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDto {
    pub id: String,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub recipient: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl From<Expense> for ExpenseDto {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            expense_type: e.expense_type,
            recipient: e.recipient,
            amount: cents_to_decimal(e.amount_cents),
            date: e.date,
        }
    }
}

/// Request DTO for recording an expense (admin)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseDto {
    #[validate(length(min = 1, max = 100, message = "Type must be 1-100 characters"))]
    #[serde(rename = "type")]
    pub expense_type: String,

    #[validate(length(min = 1, max = 255, message = "Recipient must be 1-255 characters"))]
    pub recipient: String,

    #[schema(value_type = f64)]
    pub amount: Decimal,

    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// Totals for the accounting dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummaryDto {
    /// Sum of paid invoices
    #[schema(value_type = f64)]
    pub total_revenue: Decimal,
    /// Sum of pending invoices
    #[schema(value_type = f64)]
    pub outstanding: Decimal,
    #[schema(value_type = f64)]
    pub total_expenses: Decimal,
    /// Revenue minus expenses, may be negative
    #[schema(value_type = f64)]
    pub net_profit: Decimal,
}
