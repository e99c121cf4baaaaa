//! Authentication Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{LoginRequest, RegisterRequest};
use crate::application::dto::response::{AuthResponse, UserResponse};
use crate::application::services::{AuthError, AuthService, AuthServiceImpl};
use crate::infrastructure::repositories::PgUserRepository;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn auth_service(state: &AppState) -> AuthServiceImpl<PgUserRepository> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    AuthServiceImpl::new(user_repo, state.credentials.clone())
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let (user, token) = auth_service(&state)
        .register(&body.username, &body.email, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::EmailExists => AppError::Conflict("User with this email already exists".into()),
            AuthError::UsernameExists => {
                AppError::Conflict("User with this username already exists".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let response = AuthResponse {
        token,
        user: UserResponse::from(user),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let (user, token) = auth_service(&state)
        .login(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Logout
///
/// Bearer tokens are stateless; this endpoint exists for API symmetry and
/// simply acknowledges the authenticated request.
pub async fn logout(Extension(_auth): Extension<AuthUser>) -> StatusCode {
    StatusCode::NO_CONTENT
}
