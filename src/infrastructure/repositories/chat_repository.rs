//! Chat Repository Implementation
//!
//! PostgreSQL implementation of chat operations. Participant sets are
//! loaded alongside each chat via array aggregation over the
//! `chat_participants` join table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Chat, ChatRepository, ChatType};
use crate::shared::error::AppError;

/// Internal row type for chat queries with aggregated participants.
#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    id: Uuid,
    name: Option<String>,
    chat_type: String, // PostgreSQL enum maps to string
    participant_ids: Vec<Uuid>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChatRow {
    /// Converts database row to domain Chat entity.
    fn into_chat(self) -> Chat {
        Chat {
            id: self.id,
            name: self.name,
            chat_type: ChatType::from_str(&self.chat_type),
            participant_ids: self.participant_ids,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CHAT_SELECT: &str = r#"
    SELECT c.id, c.name, c.chat_type::text AS chat_type,
           array_agg(p.user_id) AS participant_ids,
           c.created_by, c.created_at, c.updated_at
    FROM chats c
    JOIN chat_participants p ON p.chat_id = c.id
"#;

/// PostgreSQL chat repository implementation.
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    /// Creates a new PgChatRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    /// Find a chat by its ID, with the participant set loaded.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Chat>, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            "{CHAT_SELECT} WHERE c.id = $1 GROUP BY c.id"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_chat()))
    }

    /// Find all chats a user participates in, most recently active first.
    async fn find_by_participant(&self, user_id: Uuid) -> Result<Vec<Chat>, AppError> {
        let rows = sqlx::query_as::<_, ChatRow>(&format!(
            r#"{CHAT_SELECT}
            WHERE c.id IN (SELECT chat_id FROM chat_participants WHERE user_id = $1)
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_chat()).collect())
    }

    /// Find an existing direct chat between two users, if any.
    async fn find_direct_between(&self, a: Uuid, b: Uuid) -> Result<Option<Chat>, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            r#"{CHAT_SELECT}
            WHERE c.chat_type = 'direct'
              AND c.id IN (SELECT chat_id FROM chat_participants WHERE user_id = $1)
              AND c.id IN (SELECT chat_id FROM chat_participants WHERE user_id = $2)
            GROUP BY c.id
            LIMIT 1
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_chat()))
    }

    /// Create a new chat together with its participant set.
    ///
    /// The chat row and its participant rows are written in a single
    /// transaction; the participant set is immutable afterwards.
    async fn create(&self, chat: &Chat) -> Result<Chat, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chats (id, name, chat_type, created_by)
            VALUES ($1, $2, $3::chat_type, $4)
            "#,
        )
        .bind(chat.id)
        .bind(&chat.name)
        .bind(chat.chat_type.as_str())
        .bind(chat.created_by)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO chat_participants (chat_id, user_id)
            SELECT $1, user_id FROM UNNEST($2::uuid[]) AS t(user_id)
            "#,
        )
        .bind(chat.id)
        .bind(&chat.participant_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(chat.id)
            .await?
            .ok_or_else(|| AppError::Internal("Chat vanished after insert".into()))
    }

    /// Bump the chat's last-activity timestamp.
    async fn touch(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
