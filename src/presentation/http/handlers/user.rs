//! User Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::UserSearchQuery;
use crate::application::dto::response::UserResponse;
use crate::application::services::{
    AuthError, AuthService, AuthServiceImpl, UserError, UserService, UserServiceImpl,
};
use crate::infrastructure::repositories::PgUserRepository;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Get the current user
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let auth_service = AuthServiceImpl::new(user_repo, state.credentials.clone());

    let user = auth_service
        .current_user(auth.user_id)
        .await
        .map_err(|e| match e {
            // The token outlived the account; treat as an auth failure
            AuthError::UserNotFound => AppError::Unauthorized("User not found".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// List users, optionally filtered by a search term
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let user_service = UserServiceImpl::new(user_repo);

    let users = user_service
        .search_users(query.search.as_deref())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let user_service = UserServiceImpl::new(user_repo);

    let user = user_service.get_user(user_id).await.map_err(|e| match e {
        UserError::NotFound => AppError::NotFound("User not found".into()),
        e => AppError::Internal(e.to_string()),
    })?;

    Ok(Json(user))
}
