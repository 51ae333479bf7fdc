//! CRM: prospective customers and their activity history.
//!
//! Funnel: `NEW → CONTACTED → FOLLOWUP → CONVERTED | LOST` (not enforced).
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Role | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/leads` | staff | List (`?assignedTo=&status=`), staff see own |
//! | POST | `/api/leads` | staff | Create lead |
//! | GET | `/api/leads/summary` | staff | Counts per status, potential income |
//! | GET | `/api/leads/{id}` | staff | Get lead |
//! | PATCH | `/api/leads/{id}` | staff | Update lead |
//! | DELETE | `/api/leads/{id}` | admin | Delete lead (logs are kept) |
//! | GET | `/api/leads/{id}/logs` | staff | Activity, newest first |
//! | POST | `/api/leads/{id}/logs` | staff | Record activity |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::LeadService;
