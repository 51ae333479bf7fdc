//! Invoices and expenses.
//!
//! Invoices are computed from requests on every read: `PhD Proposal` costs
//! 450.00, everything else 250.00.
//!
//! | Method | Endpoint | Role |
//! |--------|----------|------|
//! | GET | `/api/accounting/invoices` | any (students see own) |
//! | GET | `/api/accounting/expenses` | staff |
//! | POST | `/api/accounting/expenses` | admin |
//! | GET | `/api/accounting/summary` | staff |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::AccountingService;
