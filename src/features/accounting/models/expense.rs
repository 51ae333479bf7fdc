use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database model for an outgoing payment
#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: String,
    #[sqlx(rename = "type")]
    pub expense_type: String,
    pub recipient: String,
    pub amount_cents: i64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
