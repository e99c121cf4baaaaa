//! Message Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{MessageHistoryQuery, SendMessageRequest};
use crate::application::dto::response::MessageResponse;
use crate::application::services::{MessageError, MessageService, MessageServiceImpl};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgChatRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn message_service(
    state: &AppState,
) -> MessageServiceImpl<PgChatRepository, PgMessageRepository, PgUserRepository> {
    let chat_repo = Arc::new(PgChatRepository::new(state.db.clone()));
    let message_repo = Arc::new(PgMessageRepository::new(state.db.clone()));
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    MessageServiceImpl::new(chat_repo, message_repo, user_repo, state.event_bus.clone())
}

fn map_message_error(e: MessageError) -> AppError {
    match e {
        MessageError::EmptyMessage => {
            AppError::Validation("Message must have content or image".into())
        }
        MessageError::ChatNotFound => AppError::NotFound("Chat not found".into()),
        MessageError::Forbidden => {
            AppError::Forbidden("You are not a participant of this chat".into())
        }
        e => AppError::Internal(e.to_string()),
    }
}

/// Get a chronological page of a chat's message history
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<MessageHistoryQuery>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = message_service(&state)
        .get_messages(auth.user_id, chat_id, query.limit, query.offset)
        .await
        .map_err(map_message_error)?;

    Ok(Json(messages))
}

/// Send a message into a chat
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let message = message_service(&state)
        .send_message(auth.user_id, chat_id, body.content, body.image_url)
        .await
        .map_err(map_message_error)?;

    metrics::record_message_sent();

    Ok((StatusCode::CREATED, Json(message)))
}
