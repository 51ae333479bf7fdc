use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::users::models::{User, UserRole};

/// Caller identity decoded from the access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role == UserRole::Staff
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    /// Staff-level access: staff and admins
    pub fn has_staff_access(&self) -> bool {
        self.is_staff() || self.is_admin()
    }
}

/// Claims carried in the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            name: claims.name,
            role: claims.role,
        }
    }
}
