use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto};
use crate::features::auth::jwt::JwtService;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::services::UserService;
use crate::shared::password::verify_password;
use std::sync::Arc;

/// Service for authentication operations
pub struct AuthService {
    user_service: Arc<UserService>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(user_service: Arc<UserService>, jwt: Arc<JwtService>) -> Self {
        Self { user_service, jwt }
    }

    /// Login with username and password.
    ///
    /// Unknown usernames, wrong passwords and role mismatches all answer
    /// with the same error.
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .user_service
            .find_by_username(&dto.username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&dto.password, &user.password_hash) {
            tracing::warn!("Failed login attempt: username={}", dto.username);
            return Err(invalid());
        }

        if let Some(role) = dto.role {
            if role != user.role {
                tracing::warn!(
                    "Login role mismatch: username={}, requested={}, actual={}",
                    dto.username,
                    role,
                    user.role
                );
                return Err(invalid());
            }
        }

        let access_token = self.jwt.issue_token(&user)?;
        tracing::info!("User logged in: id={}, role={}", user.id, user.role);

        Ok(AuthResponseDto {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.ttl_secs(),
            user: user.into(),
        })
    }

    /// Current user as stored (the token may predate profile changes)
    pub async fn get_current_user(&self, user: &AuthenticatedUser) -> Result<UserResponseDto> {
        self.user_service.get(&user.user_id).await
    }
}
