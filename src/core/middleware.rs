use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::JwtService;
use crate::features::users::UserService;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Check a `Basic` authorization header against "username:password"
fn basic_credentials_match(auth_header: Option<&str>, expected: &str) -> bool {
    auth_header
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .map(|creds| creds == expected)
        .unwrap_or(false)
}

/// Basic auth in front of the Swagger UI
pub async fn basic_auth_middleware(
    State(credentials): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if basic_credentials_match(auth_header, &credentials) {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
        "Unauthorized",
    )
        .into_response()
}

/// State for [`auth_middleware`]
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtService>,
    pub users: Arc<UserService>,
}

/// Validate the bearer token and attach the caller to the request.
///
/// The token only proves identity. Role and name are reloaded from the user
/// record, so deleted users are rejected and role changes apply immediately.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claimed = state.jwt.validate_token(token)?;

    let user = state
        .users
        .find_by_id(&claimed.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    if user.role != claimed.role {
        tracing::info!(
            "Token role outdated: user_id={}, token_role={:?}, current_role={:?}",
            user.id,
            claimed.role,
            user.role
        );
    }

    req.extensions_mut().insert(AuthenticatedUser::from(&user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_credentials_match() {
        let encoded = BASE64_STANDARD.encode("docs:secret");
        let header = format!("Basic {}", encoded);

        assert!(basic_credentials_match(Some(&header), "docs:secret"));
        assert!(!basic_credentials_match(Some(&header), "docs:other"));
        assert!(!basic_credentials_match(Some("Bearer abc"), "docs:secret"));
        assert!(!basic_credentials_match(Some("Basic !!!"), "docs:secret"));
        assert!(!basic_credentials_match(None, "docs:secret"));
    }

    mod bearer {
        use super::super::*;
        use crate::core::config::AuthConfig;
        use crate::features::users::dtos::{CreateUserDto, UpdateUserDto};
        use crate::features::users::models::{User, UserRole};
        use crate::shared::test_helpers::test_pool;
        use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
        use chrono::Utc;
        use std::time::Duration;
        use tower::ServiceExt;

        async fn state() -> AuthState {
            AuthState {
                jwt: Arc::new(JwtService::new(&AuthConfig {
                    jwt_secret: "middleware-test-secret-with-32-chars".to_string(),
                    issuer: "lexora-test".to_string(),
                    token_ttl: Duration::from_secs(600),
                    jwt_leeway: Duration::from_secs(0),
                })),
                users: Arc::new(UserService::new(test_pool().await)),
            }
        }

        fn app(state: AuthState) -> Router {
            async fn whoami(user: AuthenticatedUser) -> String {
                format!("{}:{:?}", user.username, user.role)
            }

            Router::new()
                .route("/whoami", get(whoami))
                .route_layer(from_fn_with_state(state, auth_middleware))
        }

        fn request(authorization: Option<&str>) -> Request {
            let mut builder = axum::http::Request::builder().uri("/whoami");
            if let Some(value) = authorization {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            builder.body(Body::empty()).unwrap()
        }

        async fn register(state: &AuthState, role: UserRole) -> User {
            let created = state
                .users
                .create(CreateUserDto {
                    name: "Jane Staff".to_string(),
                    username: "jane_staff".to_string(),
                    email: None,
                    password: "password123".to_string(),
                    role,
                })
                .await
                .unwrap();
            state.users.find_by_id(&created.id).await.unwrap().unwrap()
        }

        async fn body_text(response: Response) -> String {
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            String::from_utf8(bytes.to_vec()).unwrap()
        }

        #[tokio::test]
        async fn test_valid_token_reaches_handler() {
            let state = state().await;
            let user = register(&state, UserRole::Staff).await;
            let token = state.jwt.issue_token(&user).unwrap();

            let response = app(state)
                .oneshot(request(Some(&format!("Bearer {}", token))))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, "jane_staff:Staff");
        }

        #[tokio::test]
        async fn test_role_change_applies_to_live_tokens() {
            let state = state().await;
            let user = register(&state, UserRole::Admin).await;
            let token = state.jwt.issue_token(&user).unwrap();

            state
                .users
                .update(
                    &user.id,
                    UpdateUserDto {
                        role: Some(UserRole::Student),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            let response = app(state)
                .oneshot(request(Some(&format!("Bearer {}", token))))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, "jane_staff:Student");
        }

        #[tokio::test]
        async fn test_deleted_user_is_unauthorized() {
            let state = state().await;
            let token = state
                .jwt
                .issue_token(&User {
                    id: "usr_gone".to_string(),
                    name: "Gone".to_string(),
                    username: "gone".to_string(),
                    email: None,
                    password_hash: String::new(),
                    role: UserRole::Admin,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .unwrap();

            let response = app(state)
                .oneshot(request(Some(&format!("Bearer {}", token))))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_missing_or_malformed_header_is_unauthorized() {
            let state = state().await;
            for header in [None, Some("Token abc"), Some("Bearer not-a-jwt")] {
                let response = app(state.clone()).oneshot(request(header)).await.unwrap();
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
        }
    }
}
