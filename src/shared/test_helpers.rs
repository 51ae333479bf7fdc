#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;
#[cfg(test)]
use crate::features::users::models::UserRole;

#[cfg(test)]
use axum::{Extension, Router};
#[cfg(test)]
use fake::{faker::internet::en::Username, faker::name::en::Name, Fake};
#[cfg(test)]
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
#[cfg(test)]
use std::str::FromStr;

/// Fresh in-memory database with migrations applied.
///
/// The pool holds a single connection that never expires, since every
/// in-memory connection is its own database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    crate::core::database::run_migrations(&pool).await.unwrap();
    pool
}

#[cfg(test)]
pub fn create_user(id: &str, role: UserRole) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: id.to_string(),
        username: Username().fake(),
        name: Name().fake(),
        role,
    }
}

#[cfg(test)]
pub fn create_student(id: &str) -> AuthenticatedUser {
    create_user(id, UserRole::Student)
}

#[cfg(test)]
pub fn create_staff(id: &str) -> AuthenticatedUser {
    create_user(id, UserRole::Staff)
}

#[cfg(test)]
pub fn create_admin(id: &str) -> AuthenticatedUser {
    create_user(id, UserRole::Admin)
}

/// Attach a fixed caller to every request, standing in for the auth middleware
#[cfg(test)]
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(Extension(user))
}
