//! Message Service
//!
//! The message pipeline: validate, authorize, persist, enrich, publish.
//! Persistence is the durability boundary; everything after it is
//! best-effort and never rolls the message back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::dto::response::{ChatSummaryResponse, MessageResponse, UserResponse};
use crate::domain::{Chat, ChatRepository, Message, MessageRepository, User, UserRepository};
use crate::infrastructure::events::{chat_topic, EventBus};

use super::membership_guard::{GuardError, MembershipGuard, MembershipGuardImpl};

/// Default page size for message history
const DEFAULT_HISTORY_LIMIT: i64 = 50;
/// Upper bound on a single history page
const MAX_HISTORY_LIMIT: i64 = 100;

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Send a message into a chat and fan it out to live subscribers
    async fn send_message(
        &self,
        sender_id: Uuid,
        chat_id: Uuid,
        content: Option<String>,
        image_url: Option<String>,
    ) -> Result<MessageResponse, MessageError>;

    /// Get a chronological page of a chat's message history
    async fn get_messages(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MessageResponse>, MessageError>;
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message must have content or image")]
    EmptyMessage,

    #[error("Chat not found")]
    ChatNotFound,

    #[error("You are not a participant of this chat")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GuardError> for MessageError {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::ChatNotFound => MessageError::ChatNotFound,
            GuardError::Internal(msg) => MessageError::Internal(msg),
        }
    }
}

/// MessageService implementation
pub struct MessageServiceImpl<C, M, U>
where
    C: ChatRepository,
    M: MessageRepository,
    U: UserRepository,
{
    chat_repo: Arc<C>,
    message_repo: Arc<M>,
    user_repo: Arc<U>,
    guard: MembershipGuardImpl<C>,
    event_bus: Arc<EventBus<MessageResponse>>,
}

impl<C, M, U> MessageServiceImpl<C, M, U>
where
    C: ChatRepository + 'static,
    M: MessageRepository,
    U: UserRepository,
{
    pub fn new(
        chat_repo: Arc<C>,
        message_repo: Arc<M>,
        user_repo: Arc<U>,
        event_bus: Arc<EventBus<MessageResponse>>,
    ) -> Self {
        let guard = MembershipGuardImpl::new(chat_repo.clone());
        Self {
            chat_repo,
            message_repo,
            user_repo,
            guard,
            event_bus,
        }
    }

    /// Load the users backing a chat's participant set, keyed by ID.
    async fn load_participants(&self, chat: &Chat) -> Result<HashMap<Uuid, User>, MessageError> {
        let users = self
            .user_repo
            .find_by_ids(&chat.participant_ids)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Project a stored message with sender and chat-with-participants.
    fn enrich(
        message: &Message,
        chat: &Chat,
        users: &HashMap<Uuid, User>,
    ) -> Result<MessageResponse, MessageError> {
        let sender = users
            .get(&message.sender_id)
            .map(UserResponse::from)
            .ok_or_else(|| MessageError::Internal("Sender missing from participant set".into()))?;

        let participants: Vec<UserResponse> = users.values().map(UserResponse::from).collect();
        let summary = ChatSummaryResponse::new(chat, participants);

        Ok(MessageResponse::new(message, sender, summary))
    }
}

#[async_trait]
impl<C, M, U> MessageService for MessageServiceImpl<C, M, U>
where
    C: ChatRepository + 'static,
    M: MessageRepository + 'static,
    U: UserRepository + 'static,
{
    async fn send_message(
        &self,
        sender_id: Uuid,
        chat_id: Uuid,
        content: Option<String>,
        image_url: Option<String>,
    ) -> Result<MessageResponse, MessageError> {
        // A message must carry at least one of content/image
        let content = content.filter(|c| !c.is_empty());
        if content.is_none() && image_url.is_none() {
            return Err(MessageError::EmptyMessage);
        }

        // The chat must exist
        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::ChatNotFound)?;

        // Only participants may write
        if !self.guard.is_participant(sender_id, chat_id).await? {
            return Err(MessageError::Forbidden);
        }

        // Persist: the durability boundary
        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            content,
            image_url,
            created_at: Utc::now(),
        };

        let stored = self
            .message_repo
            .create(&message)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        // Best-effort activity bump; a failure here never fails the send
        if let Err(e) = self.chat_repo.touch(chat_id).await {
            tracing::warn!(chat_id = %chat_id, error = %e, "Failed to bump chat activity");
        }

        // Enrich with sender and chat projections
        let users = self.load_participants(&chat).await?;
        let enriched = Self::enrich(&stored, &chat, &users)?;

        // Publish to live subscribers; zero listeners is fine, the stored
        // message remains the source of truth
        let delivered = self
            .event_bus
            .publish(&chat_topic(chat_id), enriched.clone());
        tracing::debug!(
            chat_id = %chat_id,
            message_id = %stored.id,
            delivered = delivered,
            "Message published"
        );

        Ok(enriched)
    }

    async fn get_messages(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MessageResponse>, MessageError> {
        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::ChatNotFound)?;

        if !self.guard.is_participant(user_id, chat_id).await? {
            return Err(MessageError::Forbidden);
        }

        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
        let offset = offset.unwrap_or(0).max(0);

        let mut messages = self
            .message_repo
            .find_by_chat(chat_id, limit, offset)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        // The store pages newest-first; return the window chronologically
        messages.reverse();

        let users = self.load_participants(&chat).await?;
        messages
            .iter()
            .map(|m| Self::enrich(m, &chat, &users))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::domain::{ChatType, MockChatRepository, MockMessageRepository, MockUserRepository};

    struct Fixture {
        alice: User,
        bob: User,
        chat: Chat,
    }

    fn fixture() -> Fixture {
        let now = Utc::now();
        let alice = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        let bob = User {
            id: Uuid::new_v4(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            password_hash: "hash".into(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        let chat = Chat {
            id: Uuid::new_v4(),
            name: None,
            chat_type: ChatType::Direct,
            participant_ids: vec![alice.id, bob.id],
            created_by: alice.id,
            created_at: now,
            updated_at: now,
        };
        Fixture { alice, bob, chat }
    }

    fn chat_repo_for(chat: &Chat) -> MockChatRepository {
        let chat = chat.clone();
        let mut repo = MockChatRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(chat.clone())));
        repo.expect_touch().returning(|_| Ok(()));
        repo
    }

    fn user_repo_for(users: &[&User]) -> MockUserRepository {
        let users: Vec<User> = users.iter().map(|u| (*u).clone()).collect();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_ids()
            .returning(move |_| Ok(users.clone()));
        repo
    }

    #[tokio::test]
    async fn test_send_message_with_neither_content_nor_image_fails() {
        let fx = fixture();
        // No repository expectations: nothing may be touched before the
        // payload check rejects the request.
        let service = MessageServiceImpl::new(
            Arc::new(MockChatRepository::new()),
            Arc::new(MockMessageRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(EventBus::default()),
        );

        let result = service
            .send_message(fx.alice.id, fx.chat.id, None, None)
            .await;

        assert!(matches!(result, Err(MessageError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_send_message_empty_string_content_counts_as_absent() {
        let fx = fixture();
        let service = MessageServiceImpl::new(
            Arc::new(MockChatRepository::new()),
            Arc::new(MockMessageRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(EventBus::default()),
        );

        let result = service
            .send_message(fx.alice.id, fx.chat.id, Some(String::new()), None)
            .await;

        assert!(matches!(result, Err(MessageError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_send_message_to_missing_chat_fails() {
        let fx = fixture();
        let mut chat_repo = MockChatRepository::new();
        chat_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo),
            Arc::new(MockMessageRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(EventBus::default()),
        );

        let result = service
            .send_message(fx.alice.id, Uuid::new_v4(), Some("hi".into()), None)
            .await;

        assert!(matches!(result, Err(MessageError::ChatNotFound)));
    }

    #[tokio::test]
    async fn test_send_message_from_non_participant_persists_nothing() {
        let fx = fixture();
        let outsider = Uuid::new_v4();
        let chat_repo = chat_repo_for(&fx.chat);
        // MockMessageRepository without expectations: any create call panics
        let service = MessageServiceImpl::new(
            Arc::new(chat_repo),
            Arc::new(MockMessageRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(EventBus::default()),
        );

        let result = service
            .send_message(outsider, fx.chat.id, Some("hi".into()), None)
            .await;

        assert!(matches!(result, Err(MessageError::Forbidden)));
    }

    #[tokio::test]
    async fn test_send_message_returns_enriched_message() {
        let fx = fixture();
        let mut message_repo = MockMessageRepository::new();
        message_repo.expect_create().returning(|m| Ok(m.clone()));

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo_for(&fx.chat)),
            Arc::new(message_repo),
            Arc::new(user_repo_for(&[&fx.alice, &fx.bob])),
            Arc::new(EventBus::default()),
        );

        let message = service
            .send_message(fx.alice.id, fx.chat.id, Some("hi".into()), None)
            .await
            .unwrap();

        assert_eq!(message.content.as_deref(), Some("hi"));
        assert_eq!(message.sender.username, "alice");
        assert_eq!(message.chat.id, fx.chat.id.to_string());
        assert_eq!(message.chat.participants.len(), 2);
    }

    #[tokio::test]
    async fn test_send_message_delivers_to_prior_subscriber() {
        let fx = fixture();
        let mut message_repo = MockMessageRepository::new();
        message_repo.expect_create().returning(|m| Ok(m.clone()));

        let event_bus = Arc::new(EventBus::default());
        let mut subscription = event_bus.subscribe(&chat_topic(fx.chat.id));

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo_for(&fx.chat)),
            Arc::new(message_repo),
            Arc::new(user_repo_for(&[&fx.alice, &fx.bob])),
            event_bus,
        );

        let sent = service
            .send_message(fx.alice.id, fx.chat.id, Some("hi".into()), None)
            .await
            .unwrap();

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.id, sent.id);
        assert_eq!(event.content.as_deref(), Some("hi"));
        assert_eq!(event.sender.username, "alice");
    }

    #[tokio::test]
    async fn test_send_message_succeeds_with_zero_subscribers() {
        let fx = fixture();
        let mut message_repo = MockMessageRepository::new();
        message_repo.expect_create().returning(|m| Ok(m.clone()));

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo_for(&fx.chat)),
            Arc::new(message_repo),
            Arc::new(user_repo_for(&[&fx.alice, &fx.bob])),
            Arc::new(EventBus::default()),
        );

        // Nobody is listening; the send must still succeed
        let result = service
            .send_message(fx.alice.id, fx.chat.id, None, Some("/uploads/pic.png".into()))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_message_survives_touch_failure() {
        let fx = fixture();
        let chat = fx.chat.clone();
        let mut chat_repo = MockChatRepository::new();
        chat_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(chat.clone())));
        chat_repo
            .expect_touch()
            .returning(|_| Err(crate::shared::error::AppError::Internal("down".into())));

        let mut message_repo = MockMessageRepository::new();
        message_repo.expect_create().returning(|m| Ok(m.clone()));

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo),
            Arc::new(message_repo),
            Arc::new(user_repo_for(&[&fx.alice, &fx.bob])),
            Arc::new(EventBus::default()),
        );

        let result = service
            .send_message(fx.alice.id, fx.chat.id, Some("hi".into()), None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_messages_returns_chronological_order() {
        let fx = fixture();
        let now = Utc::now();

        let older = Message {
            id: Uuid::new_v4(),
            chat_id: fx.chat.id,
            sender_id: fx.alice.id,
            content: Some("first".into()),
            image_url: None,
            created_at: now - chrono::Duration::minutes(1),
        };
        let newer = Message {
            id: Uuid::new_v4(),
            chat_id: fx.chat.id,
            sender_id: fx.bob.id,
            content: Some("second".into()),
            image_url: None,
            created_at: now,
        };

        let mut message_repo = MockMessageRepository::new();
        // Store pages newest-first
        let window = vec![newer.clone(), older.clone()];
        message_repo
            .expect_find_by_chat()
            .returning(move |_, _, _| Ok(window.clone()));

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo_for(&fx.chat)),
            Arc::new(message_repo),
            Arc::new(user_repo_for(&[&fx.alice, &fx.bob])),
            Arc::new(EventBus::default()),
        );

        let messages = service
            .get_messages(fx.alice.id, fx.chat.id, None, None)
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content.as_deref(), Some("first"));
        assert_eq!(messages[1].content.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_get_messages_forbidden_for_non_participant() {
        let fx = fixture();
        let outsider = Uuid::new_v4();

        let service = MessageServiceImpl::new(
            Arc::new(chat_repo_for(&fx.chat)),
            Arc::new(MockMessageRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(EventBus::default()),
        );

        let result = service.get_messages(outsider, fx.chat.id, None, None).await;

        assert!(matches!(result, Err(MessageError::Forbidden)));
    }
}
