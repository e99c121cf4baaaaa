//! Response DTOs
//!
//! Data structures for API response bodies. `MessageResponse` doubles as
//! the enriched event payload published on the event bus, so subscribers
//! receive a delivery-ready message without a follow-up query.

use serde::{Deserialize, Serialize};

use crate::domain::{Chat, ChatType, Message, User};

/// User profile response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Chat projection embedded in message events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummaryResponse {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub participants: Vec<UserResponse>,
}

impl ChatSummaryResponse {
    /// Project a chat and its resolved participants.
    pub fn new(chat: &Chat, participants: Vec<UserResponse>) -> Self {
        Self {
            id: chat.id.to_string(),
            name: chat.name.clone(),
            chat_type: chat.chat_type,
            participants,
        }
    }
}

/// Enriched message: the persisted record plus sender and chat projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub chat: ChatSummaryResponse,
    pub sender: UserResponse,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

impl MessageResponse {
    /// Assemble the enriched projection of a stored message.
    pub fn new(message: &Message, sender: UserResponse, chat: ChatSummaryResponse) -> Self {
        Self {
            id: message.id.to_string(),
            chat,
            sender,
            content: message.content.clone(),
            image_url: message.image_url.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Full chat response for chat endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub participants: Vec<UserResponse>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_message: Option<MessageResponse>,
}

impl ChatResponse {
    /// Project a chat, its resolved participants and last-message preview.
    pub fn new(
        chat: &Chat,
        participants: Vec<UserResponse>,
        last_message: Option<MessageResponse>,
    ) -> Self {
        Self {
            id: chat.id.to_string(),
            name: chat.name.clone(),
            chat_type: chat.chat_type,
            participants,
            created_by: chat.created_by.to_string(),
            created_at: chat.created_at.to_rfc3339(),
            updated_at: chat.updated_at.to_rfc3339(),
            last_message,
        }
    }
}

/// Authentication response (register/login)
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Image upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".into(),
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_from_user() {
        let user = test_user("alice");
        let response = UserResponse::from(&user);

        assert_eq!(response.id, user.id.to_string());
        assert_eq!(response.username, "alice");
        assert_eq!(response.email, "alice@example.com");
    }

    #[test]
    fn test_message_response_serializes_chat_type_uppercase() {
        let alice = test_user("alice");
        let bob = test_user("bob");
        let chat = Chat {
            id: Uuid::new_v4(),
            name: None,
            chat_type: ChatType::Direct,
            participant_ids: vec![alice.id, bob.id],
            created_by: alice.id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let message = Message {
            id: Uuid::new_v4(),
            chat_id: chat.id,
            sender_id: alice.id,
            content: Some("hi".into()),
            image_url: None,
            created_at: Utc::now(),
        };

        let participants = vec![UserResponse::from(&alice), UserResponse::from(&bob)];
        let summary = ChatSummaryResponse::new(&chat, participants);
        let response = MessageResponse::new(&message, UserResponse::from(&alice), summary);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"type\":\"DIRECT\""));
        assert!(json.contains("\"content\":\"hi\""));
    }
}
