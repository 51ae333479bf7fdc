/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Prefix of generated request ids (`REQ-000001`)
pub const REQUEST_ID_PREFIX: &str = "REQ-";

/// Digits in the numeric part of a request id
pub const REQUEST_ID_DIGITS: usize = 6;

/// Prefix of derived invoice ids (`INV-000001`)
pub const INVOICE_ID_PREFIX: &str = "INV-";

/// Prefix of generated expense ids (`EXP-001`)
pub const EXPENSE_ID_PREFIX: &str = "EXP-";

pub const EXPENSE_ID_DIGITS: usize = 3;

// =============================================================================
// PRICING (in cents)
// =============================================================================

/// Request type billed at the premium rate
pub const PREMIUM_REQUEST_TYPE: &str = "PhD Proposal";

pub const PREMIUM_PRICE_CENTS: i64 = 45_000;

pub const STANDARD_PRICE_CENTS: i64 = 25_000;
