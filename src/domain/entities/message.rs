//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a message sent into a chat.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY
/// - chat_id: UUID NOT NULL REFERENCES chats(id)
/// - sender_id: UUID NOT NULL REFERENCES users(id)
/// - content: VARCHAR(2000) NULL
/// - image_url: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - CHECK (content IS NOT NULL OR image_url IS NOT NULL)
///
/// Messages are immutable: they are never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Primary key
    pub id: Uuid,

    /// Chat the message belongs to
    pub chat_id: Uuid,

    /// Sender, a participant of the chat at send time
    pub sender_id: Uuid,

    /// Text content (up to 2000 characters)
    pub content: Option<String>,

    /// URL of an attached image
    pub image_url: Option<String>,

    /// Timestamp when message was sent
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Check that the message carries at least one of content or image.
    pub fn has_payload(&self) -> bool {
        self.content.is_some() || self.image_url.is_some()
    }
}

/// Repository trait for Message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Create a new message.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Find messages in a chat, newest first, with limit/offset pagination.
    async fn find_by_chat(
        &self,
        chat_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, AppError>;

    /// Find the most recent message in a chat, if any.
    async fn find_last_by_chat(&self, chat_id: Uuid) -> Result<Option<Message>, AppError>;
}
