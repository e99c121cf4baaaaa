//! Chat entity and repository trait.
//!
//! Maps to the `chats` and `chat_participants` tables in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Chat types matching the PostgreSQL ENUM `chat_type`.
///
/// Database definition:
/// ```sql
/// CREATE TYPE chat_type AS ENUM (
///     'direct',  -- One-to-one conversation, exactly two participants
///     'group'    -- Group conversation, at least three participants
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChatType {
    /// A one-to-one conversation
    Direct,
    /// A named group conversation
    Group,
}

impl ChatType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "group" => Self::Group,
            _ => Self::Direct,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
        }
    }

    /// Check whether `count` distinct participants is a valid set size
    /// for this chat type. Direct chats have exactly two participants,
    /// group chats at least three.
    pub fn allows_participant_count(&self, count: usize) -> bool {
        match self {
            Self::Direct => count == 2,
            Self::Group => count >= 3,
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a conversation between users.
///
/// Maps to the `chats` table plus the `chat_participants` join table:
/// - id: UUID PRIMARY KEY
/// - name: VARCHAR(100) NULL (group chats only)
/// - chat_type: chat_type NOT NULL
/// - created_by: UUID NOT NULL REFERENCES users(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// The participant set is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Primary key
    pub id: Uuid,

    /// Display name (group chats; direct chats have none)
    pub name: Option<String>,

    /// Type of chat
    #[serde(rename = "type")]
    pub chat_type: ChatType,

    /// IDs of all participants (order-irrelevant set)
    pub participant_ids: Vec<Uuid>,

    /// User who created the chat
    pub created_by: Uuid,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp, bumped when a message is sent
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Check whether a user is a participant of this chat.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participant_ids.contains(&user_id)
    }

    /// Number of participants.
    pub fn participant_count(&self) -> usize {
        self.participant_ids.len()
    }
}

/// Repository trait for Chat data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Find a chat by its ID, with the participant set loaded.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Chat>, AppError>;

    /// Find all chats a user participates in, most recently active first.
    async fn find_by_participant(&self, user_id: Uuid) -> Result<Vec<Chat>, AppError>;

    /// Find an existing direct chat between two users, if any.
    async fn find_direct_between(&self, a: Uuid, b: Uuid) -> Result<Option<Chat>, AppError>;

    /// Create a new chat together with its participant set.
    async fn create(&self, chat: &Chat) -> Result<Chat, AppError>;

    /// Bump the chat's last-activity timestamp.
    async fn touch(&self, id: Uuid) -> Result<(), AppError>;
}
