use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::leads::models::{Lead, LeadStatus};
use crate::shared::money::cents_to_decimal;
use crate::shared::types::empty_as_none;

/// Response DTO for a lead
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponseDto {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub assignment_type: String,
    #[schema(value_type = f64)]
    pub potential_income: Decimal,
    pub status: LeadStatus,
    pub assigned_to: Option<String>,
    pub assigned_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lead> for LeadResponseDto {
    fn from(l: Lead) -> Self {
        Self {
            id: l.id,
            name: l.name,
            phone: l.phone,
            email: l.email,
            country: l.country,
            assignment_type: l.assignment_type,
            potential_income: cents_to_decimal(l.potential_income_cents),
            status: l.status,
            assigned_to: l.assigned_to,
            assigned_name: l.assigned_name,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// Request DTO for a new lead.
///
/// Staff always own the leads they create; admins may assign anyone or
/// leave the lead unassigned.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 50, message = "Phone must not exceed 50 characters"))]
    pub phone: Option<String>,

    pub email: Option<String>,

    #[validate(length(max = 100, message = "Country must not exceed 100 characters"))]
    pub country: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Assignment type must be 1-100 characters"))]
    #[serde(default = "default_assignment_type")]
    pub assignment_type: String,

    #[serde(default)]
    #[schema(value_type = f64)]
    pub potential_income: Decimal,

    pub status: Option<LeadStatus>,
    pub assigned_to: Option<String>,
    pub assigned_name: Option<String>,
}

fn default_assignment_type() -> String {
    "Essay".to_string()
}

/// Partial lead update. Fields the server owns (`id`, `createdAt`) are
/// ignored if a client echoes them back.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "Phone must not exceed 50 characters"))]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[validate(length(max = 100, message = "Country must not exceed 100 characters"))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Assignment type must be 1-100 characters"))]
    pub assignment_type: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub potential_income: Option<Decimal>,
    pub status: Option<LeadStatus>,
    pub assigned_to: Option<String>,
    pub assigned_name: Option<String>,
}

impl UpdateLeadDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.country.is_none()
            && self.assignment_type.is_none()
            && self.potential_income.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.assigned_name.is_none()
    }
}

/// Query params for listing leads
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListLeadsQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeadStatusCount {
    pub status: LeadStatus,
    pub count: i64,
}

/// Pipeline overview for the CRM board header
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummaryDto {
    pub total: i64,
    /// One entry per funnel stage, zero counts included
    pub by_status: Vec<LeadStatusCount>,
    #[schema(value_type = f64)]
    pub total_potential_income: Decimal,
}
