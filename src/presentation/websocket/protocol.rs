//! WebSocket Frame Types
//!
//! JSON frame protocol for the subscription gateway, plus connect-time
//! credential extraction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::dto::response::MessageResponse;

/// Incoming gateway frame
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Connection establishment; carries the credential parameter map
    ConnectionInit {
        #[serde(default)]
        params: HashMap<String, serde_json::Value>,
    },
    /// Subscribe to a chat's message stream
    Subscribe { chat_id: Uuid },
    /// Unsubscribe from a chat's message stream
    Unsubscribe { chat_id: Uuid },
    /// Application-level keepalive
    Ping,
}

/// Outgoing gateway frame
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Acknowledges connection establishment
    ConnectionAck { authenticated: bool },
    /// Acknowledges a subscription
    Subscribed { chat_id: Uuid },
    /// Acknowledges an unsubscription
    Unsubscribed { chat_id: Uuid },
    /// A delivered message event
    Message {
        chat_id: Uuid,
        payload: MessageResponse,
    },
    /// An operation-level error; the connection stays open
    Error {
        code: GatewayErrorCode,
        message: String,
    },
    /// Keepalive reply
    Pong,
}

/// Error codes surfaced over the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    AuthenticationError,
    Forbidden,
    NotFound,
    InvalidRequest,
    Internal,
}

/// Extract a bearer credential from connection-establishment parameters.
///
/// Recognized keys, in precedence order: `authorization` (value
/// `"Bearer <token>"`), `Authorization` (same form), `token` (bare token).
/// The `Bearer` prefix is stripped case-insensitively; a value without
/// the prefix is taken as the token itself.
pub fn extract_token(params: &HashMap<String, serde_json::Value>) -> Option<String> {
    for key in ["authorization", "Authorization"] {
        if let Some(value) = params.get(key).and_then(|v| v.as_str()) {
            return Some(strip_bearer(value));
        }
    }

    params
        .get("token")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
}

fn strip_bearer(value: &str) -> String {
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => {
            value[7..].trim_start().to_string()
        }
        _ => value.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn params(entries: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test_case("Bearer abc123", "abc123" ; "standard bearer prefix")]
    #[test_case("bearer abc123", "abc123" ; "lowercase bearer prefix")]
    #[test_case("BEARER abc123", "abc123" ; "uppercase bearer prefix")]
    #[test_case("Bearer   abc123", "abc123" ; "extra whitespace after prefix")]
    #[test_case("abc123", "abc123" ; "bare value without prefix")]
    fn test_strip_bearer(input: &str, expected: &str) {
        assert_eq!(strip_bearer(input), expected);
    }

    #[test]
    fn test_extract_token_lowercase_authorization_key() {
        let params = params(&[("authorization", json!("Bearer tok-1"))]);
        assert_eq!(extract_token(&params).as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_extract_token_capitalized_authorization_key() {
        let params = params(&[("Authorization", json!("Bearer tok-2"))]);
        assert_eq!(extract_token(&params).as_deref(), Some("tok-2"));
    }

    #[test]
    fn test_extract_token_bare_token_key() {
        let params = params(&[("token", json!("tok-3"))]);
        assert_eq!(extract_token(&params).as_deref(), Some("tok-3"));
    }

    #[test]
    fn test_extract_token_precedence_order() {
        let params = params(&[
            ("authorization", json!("Bearer first")),
            ("Authorization", json!("Bearer second")),
            ("token", json!("third")),
        ]);
        assert_eq!(extract_token(&params).as_deref(), Some("first"));

        let params = params_without_lowercase();
        assert_eq!(extract_token(&params).as_deref(), Some("second"));
    }

    fn params_without_lowercase() -> HashMap<String, serde_json::Value> {
        params(&[
            ("Authorization", json!("Bearer second")),
            ("token", json!("third")),
        ])
    }

    #[test]
    fn test_extract_token_absent() {
        assert_eq!(extract_token(&HashMap::new()), None);
    }

    #[test]
    fn test_extract_token_ignores_non_string_values() {
        let params = params(&[("authorization", json!(42))]);
        assert_eq!(extract_token(&params), None);
    }

    #[test]
    fn test_client_frame_connection_init_parses() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type": "connection_init", "params": {"token": "abc"}}"#,
        )
        .unwrap();

        match frame {
            ClientFrame::ConnectionInit { params } => {
                assert_eq!(params.get("token").unwrap(), "abc");
            }
            other => panic!("Expected connection_init, got {:?}", other),
        }
    }

    #[test]
    fn test_client_frame_connection_init_params_default_to_empty() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type": "connection_init"}"#).unwrap();

        match frame {
            ClientFrame::ConnectionInit { params } => assert!(params.is_empty()),
            other => panic!("Expected connection_init, got {:?}", other),
        }
    }

    #[test]
    fn test_client_frame_subscribe_parses() {
        let chat_id = Uuid::new_v4();
        let frame: ClientFrame = serde_json::from_str(&format!(
            r#"{{"type": "subscribe", "chat_id": "{}"}}"#,
            chat_id
        ))
        .unwrap();

        match frame {
            ClientFrame::Subscribe { chat_id: parsed } => assert_eq!(parsed, chat_id),
            other => panic!("Expected subscribe, got {:?}", other),
        }
    }

    #[test]
    fn test_server_frame_error_serializes_snake_case_code() {
        let frame = ServerFrame::Error {
            code: GatewayErrorCode::AuthenticationError,
            message: "Authentication required".into(),
        };

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"code\":\"authentication_error\""));
    }

    #[test]
    fn test_server_frame_connection_ack_serializes() {
        let frame = ServerFrame::ConnectionAck {
            authenticated: false,
        };

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"connection_ack\""));
        assert!(json.contains("\"authenticated\":false"));
    }
}
