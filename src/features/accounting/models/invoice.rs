use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{
    INVOICE_ID_PREFIX, PREMIUM_PRICE_CENTS, PREMIUM_REQUEST_TYPE, STANDARD_PRICE_CENTS,
};

/// Invoices are not stored; one is derived from every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum InvoiceStatus {
    Paid,
    Pending,
}

impl From<bool> for InvoiceStatus {
    fn from(is_paid: bool) -> Self {
        if is_paid {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Pending
        }
    }
}

/// Flat price of a request by its type
pub fn invoice_amount_cents(request_type: &str) -> i64 {
    if request_type == PREMIUM_REQUEST_TYPE {
        PREMIUM_PRICE_CENTS
    } else {
        STANDARD_PRICE_CENTS
    }
}

/// `REQ-000042` -> `INV-000042`
pub fn invoice_id(request_id: &str) -> String {
    let number = request_id
        .split_once('-')
        .map(|(_, n)| n)
        .unwrap_or(request_id);
    format!("{}{}", INVOICE_ID_PREFIX, number)
}
