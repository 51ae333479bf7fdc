use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::leads::models::{LeadLog, LeadLogAction};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadLogResponseDto {
    pub id: String,
    pub lead_id: String,
    pub user_id: String,
    pub user_name: String,
    pub action: LeadLogAction,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<LeadLog> for LeadLogResponseDto {
    fn from(l: LeadLog) -> Self {
        Self {
            id: l.id,
            lead_id: l.lead_id,
            user_id: l.user_id,
            user_name: l.user_name,
            action: l.action,
            content: l.content,
            created_at: l.created_at,
        }
    }
}

/// New activity entry; the author is always the caller
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLeadLogDto {
    #[serde(default)]
    pub action: LeadLogAction,

    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,
}
