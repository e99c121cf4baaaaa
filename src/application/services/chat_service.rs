//! Chat Service
//!
//! Chat creation and listing. Enforces the participant-set invariants:
//! direct chats have exactly two distinct participants, group chats at
//! least three (creator included).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::dto::response::{
    ChatResponse, ChatSummaryResponse, MessageResponse, UserResponse,
};
use crate::domain::{Chat, ChatRepository, ChatType, MessageRepository, User, UserRepository};

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Create a group chat with the creator and the given participants
    async fn create_group_chat(
        &self,
        creator_id: Uuid,
        name: &str,
        participant_ids: &[Uuid],
    ) -> Result<ChatResponse, ChatError>;

    /// Create (or return the existing) direct chat between two users
    async fn create_direct_chat(
        &self,
        creator_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ChatResponse, ChatError>;

    /// List the caller's chats, most recently active first
    async fn list_chats(&self, user_id: Uuid) -> Result<Vec<ChatResponse>, ChatError>;

    /// Get a single chat; participants only
    async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<ChatResponse, ChatError>;
}

/// Chat service errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat not found")]
    NotFound,

    #[error("You are not a participant of this chat")]
    Forbidden,

    #[error("Group chat must have at least 3 participants")]
    TooFewParticipants,

    #[error("Cannot create a direct chat with yourself")]
    SelfDirectChat,

    #[error("One or more participants not found")]
    ParticipantNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ChatService implementation
pub struct ChatServiceImpl<C, M, U>
where
    C: ChatRepository,
    M: MessageRepository,
    U: UserRepository,
{
    chat_repo: Arc<C>,
    message_repo: Arc<M>,
    user_repo: Arc<U>,
}

impl<C, M, U> ChatServiceImpl<C, M, U>
where
    C: ChatRepository,
    M: MessageRepository,
    U: UserRepository,
{
    pub fn new(chat_repo: Arc<C>, message_repo: Arc<M>, user_repo: Arc<U>) -> Self {
        Self {
            chat_repo,
            message_repo,
            user_repo,
        }
    }

    /// Load the users backing a chat's participant set, keyed by ID.
    async fn load_participants(&self, chat: &Chat) -> Result<HashMap<Uuid, User>, ChatError> {
        let users = self
            .user_repo
            .find_by_ids(&chat.participant_ids)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Project a chat with participants and last-message preview.
    async fn project_chat(&self, chat: &Chat) -> Result<ChatResponse, ChatError> {
        let users = self.load_participants(chat).await?;
        let participants: Vec<UserResponse> = users.values().map(UserResponse::from).collect();
        let summary = ChatSummaryResponse::new(chat, participants.clone());

        let last_message = self
            .message_repo
            .find_last_by_chat(chat.id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .and_then(|message| {
                users
                    .get(&message.sender_id)
                    .map(|sender| {
                        MessageResponse::new(&message, UserResponse::from(sender), summary.clone())
                    })
            });

        Ok(ChatResponse::new(chat, participants, last_message))
    }
}

#[async_trait]
impl<C, M, U> ChatService for ChatServiceImpl<C, M, U>
where
    C: ChatRepository + 'static,
    M: MessageRepository + 'static,
    U: UserRepository + 'static,
{
    async fn create_group_chat(
        &self,
        creator_id: Uuid,
        name: &str,
        participant_ids: &[Uuid],
    ) -> Result<ChatResponse, ChatError> {
        // Deduplicate, always including the creator
        let mut all_participants = vec![creator_id];
        for id in participant_ids {
            if !all_participants.contains(id) {
                all_participants.push(*id);
            }
        }

        if !ChatType::Group.allows_participant_count(all_participants.len()) {
            return Err(ChatError::TooFewParticipants);
        }

        // All participants must exist
        let users = self
            .user_repo
            .find_by_ids(&all_participants)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;
        if users.len() != all_participants.len() {
            return Err(ChatError::ParticipantNotFound);
        }

        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            name: Some(name.to_string()),
            chat_type: ChatType::Group,
            participant_ids: all_participants,
            created_by: creator_id,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .chat_repo
            .create(&chat)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.project_chat(&created).await
    }

    async fn create_direct_chat(
        &self,
        creator_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ChatResponse, ChatError> {
        if creator_id == participant_id {
            return Err(ChatError::SelfDirectChat);
        }

        // The other participant must exist
        self.user_repo
            .find_by_id(participant_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::ParticipantNotFound)?;

        // An existing direct chat between the pair is returned, not duplicated
        if let Some(existing) = self
            .chat_repo
            .find_direct_between(creator_id, participant_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
        {
            return self.project_chat(&existing).await;
        }

        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            name: None,
            chat_type: ChatType::Direct,
            participant_ids: vec![creator_id, participant_id],
            created_by: creator_id,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .chat_repo
            .create(&chat)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.project_chat(&created).await
    }

    async fn list_chats(&self, user_id: Uuid) -> Result<Vec<ChatResponse>, ChatError> {
        let chats = self
            .chat_repo
            .find_by_participant(user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        let mut responses = Vec::with_capacity(chats.len());
        for chat in &chats {
            responses.push(self.project_chat(chat).await?);
        }

        Ok(responses)
    }

    async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<ChatResponse, ChatError> {
        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::NotFound)?;

        if !chat.is_participant(user_id) {
            return Err(ChatError::Forbidden);
        }

        self.project_chat(&chat).await
    }
}
