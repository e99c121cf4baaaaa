//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 32, message = "Username must be 2-32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create group chat request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupChatRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub participant_ids: Vec<Uuid>,
}

/// Create direct chat request
#[derive(Debug, Deserialize)]
pub struct CreateDirectChatRequest {
    pub participant_id: Uuid,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 2000, message = "Content must be at most 2000 characters"))]
    pub content: Option<String>,

    pub image_url: Option<String>,
}

/// User search query parameters
#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

/// Message history query parameters
#[derive(Debug, Deserialize)]
pub struct MessageHistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rejects_short_password() {
        let request = RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "12345".into(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_invalid_email() {
        let request = RegisterRequest {
            username: "alice".into(),
            email: "not-an-email".into(),
            password: "secret123".into(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_accepts_valid_input() {
        let request = RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret123".into(),
        };

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_send_message_request_rejects_overlong_content() {
        let request = SendMessageRequest {
            content: Some("x".repeat(2001)),
            image_url: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_send_message_request_allows_empty_body() {
        // Payload presence is a pipeline rule, not a field-shape rule;
        // the service rejects it with a validation error of its own.
        let request = SendMessageRequest {
            content: None,
            image_url: None,
        };

        assert!(request.validate().is_ok());
    }
}
