//! Money is stored as integer cents and exposed as two-place decimals.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::error::{AppError, Result};

pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Convert an amount to cents, rounding half away from zero to two places
pub fn decimal_to_cents(amount: Decimal) -> Result<i64> {
    if amount.is_sign_negative() {
        return Err(AppError::Validation("Amount must not be negative".to_string()));
    }

    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| AppError::Validation("Amount is out of range".to_string()))
}
