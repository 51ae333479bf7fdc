//! User accounts and self-service profile management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Role | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/users` | staff | List users (`?role=`) |
//! | POST | `/api/users` | admin | Create user |
//! | GET | `/api/users/{id}` | staff | Get user |
//! | PATCH | `/api/users/{id}` | admin | Update user |
//! | DELETE | `/api/users/{id}` | admin | Delete user |
//! | GET/PATCH | `/api/users/me` | any | Own profile |
//! | POST | `/api/users/me/password` | any | Change own password |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::UserService;
