//! Chat Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{CreateDirectChatRequest, CreateGroupChatRequest};
use crate::application::dto::response::ChatResponse;
use crate::application::services::{ChatError, ChatService, ChatServiceImpl};
use crate::infrastructure::repositories::{
    PgChatRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn chat_service(
    state: &AppState,
) -> ChatServiceImpl<PgChatRepository, PgMessageRepository, PgUserRepository> {
    let chat_repo = Arc::new(PgChatRepository::new(state.db.clone()));
    let message_repo = Arc::new(PgMessageRepository::new(state.db.clone()));
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    ChatServiceImpl::new(chat_repo, message_repo, user_repo)
}

fn map_chat_error(e: ChatError) -> AppError {
    match e {
        ChatError::NotFound => AppError::NotFound("Chat not found".into()),
        ChatError::Forbidden => {
            AppError::Forbidden("You are not a participant of this chat".into())
        }
        ChatError::TooFewParticipants => {
            AppError::Validation("Group chat must have at least 3 participants".into())
        }
        ChatError::SelfDirectChat => {
            AppError::Validation("Cannot create a direct chat with yourself".into())
        }
        ChatError::ParticipantNotFound => {
            AppError::BadRequest("One or more participants not found".into())
        }
        e => AppError::Internal(e.to_string()),
    }
}

/// List the caller's chats
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ChatResponse>>, AppError> {
    let chats = chat_service(&state)
        .list_chats(auth.user_id)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(chats))
}

/// Get a single chat
pub async fn get_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatResponse>, AppError> {
    let chat = chat_service(&state)
        .get_chat(auth.user_id, chat_id)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(chat))
}

/// Create a group chat
pub async fn create_group_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateGroupChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let chat = chat_service(&state)
        .create_group_chat(auth.user_id, &body.name, &body.participant_ids)
        .await
        .map_err(map_chat_error)?;

    Ok((StatusCode::CREATED, Json(chat)))
}

/// Create (or return the existing) direct chat with another user
pub async fn create_direct_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateDirectChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    let chat = chat_service(&state)
        .create_direct_chat(auth.user_id, body.participant_id)
        .await
        .map_err(map_chat_error)?;

    Ok((StatusCode::CREATED, Json(chat)))
}
