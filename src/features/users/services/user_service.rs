use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::dtos::{
    ChangePasswordDto, CreateUserDto, UpdateProfileDto, UpdateUserDto, UserResponseDto,
};
use crate::features::users::models::{User, UserRole};
use crate::shared::password::{hash_password, verify_password};
use crate::shared::types::PaginationQuery;

/// Service for user accounts
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List users, optionally filtered by role, ordered by name.
    /// Without a page every matching user is returned.
    pub async fn list(
        &self,
        role: Option<UserRole>,
        page: Option<&PaginationQuery>,
    ) -> Result<(Vec<UserResponseDto>, i64)> {
        // LIMIT -1 is unbounded in SQLite
        let (offset, limit) = page.map_or((0, -1), |p| (p.offset(), p.limit()));

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (?1 IS NULL OR role = ?1)")
                .bind(role)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count users: {:?}", e);
                    AppError::Database(e)
                })?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE (?1 IS NULL OR role = ?1)
            ORDER BY name, username
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((users.into_iter().map(|u| u.into()).collect(), total))
    }

    /// Get the full user row (including the password hash)
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user by id: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user by username: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn get(&self, id: &str) -> Result<UserResponseDto> {
        self.find_by_id(id)
            .await?
            .map(|u| u.into())
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))
    }

    pub async fn create(&self, dto: CreateUserDto) -> Result<UserResponseDto> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, username, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING id, name, username, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(&dto.name)
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(hash_password(&dto.password))
        .bind(dto.role)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
        .map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict(format!("Username '{}' is already taken", dto.username))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                e
            }
        })?;

        tracing::info!(
            "User created: id={}, username={}, role={}",
            user.id,
            user.username,
            user.role
        );

        Ok(user.into())
    }

    /// Partial update; absent fields keep their stored value
    pub async fn update(&self, id: &str, dto: UpdateUserDto) -> Result<UserResponseDto> {
        let password_hash = dto.password.as_deref().map(hash_password);

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE(?1, name),
                email = COALESCE(?2, email),
                role = COALESCE(?3, role),
                password_hash = COALESCE(?4, password_hash),
                updated_at = ?5
            WHERE id = ?6
            RETURNING id, name, username, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(dto.role)
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user: {:?}", e);
            AppError::Database(e)
        })?;

        let user = user.ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))?;
        tracing::info!("User updated: id={}", user.id);

        Ok(user.into())
    }

    pub async fn update_profile(&self, id: &str, dto: UpdateProfileDto) -> Result<UserResponseDto> {
        self.update(
            id,
            UpdateUserDto {
                name: dto.name,
                email: dto.email,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn change_password(&self, id: &str, dto: ChangePasswordDto) -> Result<()> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))?;

        if !verify_password(&dto.current_password, &user.password_hash) {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }

        self.update(
            id,
            UpdateUserDto {
                password: Some(dto.new_password),
                ..Default::default()
            },
        )
        .await?;

        tracing::info!("Password changed: id={}", id);
        Ok(())
    }

    /// Delete a user. The acting admin cannot remove their own account.
    pub async fn delete(&self, id: &str, acting_user_id: &str) -> Result<()> {
        if id == acting_user_id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User '{}' not found", id)));
        }

        tracing::info!("User deleted: id={} by={}", id, acting_user_id);
        Ok(())
    }

    /// Create the initial admin account unless the username already exists.
    /// Returns true when a user was created.
    pub async fn ensure_admin(&self, username: &str, password: &str, name: &str) -> Result<bool> {
        if self.find_by_username(username).await?.is_some() {
            return Ok(false);
        }

        self.create(CreateUserDto {
            name: name.to_string(),
            username: username.to_string(),
            email: None,
            password: password.to_string(),
            role: UserRole::Admin,
        })
        .await?;

        Ok(true)
    }
}
