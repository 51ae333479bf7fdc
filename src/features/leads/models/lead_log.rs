use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

/// Kind of activity recorded against a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadLogAction {
    #[default]
    Note,
    Call,
    Message,
    Followup,
}

/// Append-only activity entry
#[derive(Debug, Clone, FromRow)]
pub struct LeadLog {
    pub id: String,
    pub lead_id: String,
    pub user_id: String,
    pub user_name: String,
    pub action: LeadLogAction,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
