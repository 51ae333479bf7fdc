//! Assignment requests and their fulfilment workflow.
//!
//! ```text
//! PENDING_ASSIGNMENT --claim--> IN_PROGRESS --submit--> UNDER_REVIEW --verify--> APPROVED
//!                                                   ^                       |
//!                                                   +------ REJECTED <------+
//! ```
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Role | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/requests` | any | List (`?studentId=&assignedTo=&status=`), students see own |
//! | POST | `/api/requests` | student | Submit a request |
//! | GET | `/api/requests/queue` | staff | Own, unclaimed and rejected requests |
//! | GET | `/api/requests/stats` | any | Totals, scoped for students |
//! | GET | `/api/requests/{id}` | any | Get request, students see own |
//! | PATCH | `/api/requests/{id}` | staff | Field-level update |
//! | POST | `/api/requests/{id}/claim` | staff | Take an unassigned request |
//! | POST | `/api/requests/{id}/submit` | staff | Hand in work (assignee or admin) |
//! | POST | `/api/requests/{id}/verify` | admin | Approve or reject |
//! | POST | `/api/requests/{id}/pay` | student/admin | Mark as paid |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::RequestService;
