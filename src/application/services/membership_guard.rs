//! Membership Guard
//!
//! Decides whether an identity may read or write a chat's stream. The
//! message pipeline (pre-persist) and the subscription gateway
//! (pre-subscribe) both go through this one component, so the two
//! enforcement points cannot drift apart.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ChatRepository;

/// Membership guard errors
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Chat not found")]
    ChatNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authorization check for chat membership
#[async_trait]
pub trait MembershipGuard: Send + Sync {
    /// Check whether `user_id` is a participant of `chat_id`.
    ///
    /// Fails with `GuardError::ChatNotFound` when the chat does not exist.
    async fn is_participant(&self, user_id: Uuid, chat_id: Uuid) -> Result<bool, GuardError>;
}

/// MembershipGuard implementation backed by the chat repository.
pub struct MembershipGuardImpl<C>
where
    C: ChatRepository,
{
    chat_repo: Arc<C>,
}

impl<C> MembershipGuardImpl<C>
where
    C: ChatRepository,
{
    pub fn new(chat_repo: Arc<C>) -> Self {
        Self { chat_repo }
    }
}

#[async_trait]
impl<C> MembershipGuard for MembershipGuardImpl<C>
where
    C: ChatRepository + 'static,
{
    async fn is_participant(&self, user_id: Uuid, chat_id: Uuid) -> Result<bool, GuardError> {
        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| GuardError::Internal(e.to_string()))?
            .ok_or(GuardError::ChatNotFound)?;

        Ok(chat.is_participant(user_id))
    }
}
