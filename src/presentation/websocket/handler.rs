//! WebSocket Connection Handler
//!
//! Handles individual subscription-gateway connections. Identity is
//! resolved once from the `connection_init` parameters; membership is
//! re-checked once per subscription; delivery then runs until
//! unsubscribe or close.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use super::protocol::{extract_token, ClientFrame, GatewayErrorCode, ServerFrame};
use super::session::ConnectionSession;
use crate::application::services::{GuardError, MembershipGuard, MembershipGuardImpl};
use crate::infrastructure::events::chat_topic;
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::PgChatRepository;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual gateway connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut session = ConnectionSession::new();
    let connection_id = session.connection_id;

    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");
    metrics::add_connected(1.0);

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing frames; subscription tasks push into it directly
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerFrame>();

    // Spawn task to forward frames from the channel to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Connection establishment: wait for connection_init (with timeout)
    let init_timeout = Duration::from_secs(state.settings.gateway.init_timeout_secs);
    let init_params = match timeout(init_timeout, wait_for_init(&mut receiver)).await {
        Ok(Some(params)) => params,
        Ok(None) => {
            tracing::debug!(connection_id = %connection_id, "Connection closed before init");
            metrics::add_connected(-1.0);
            sender_task.abort();
            return;
        }
        Err(_) => {
            tracing::debug!(connection_id = %connection_id, "Connection init timeout");
            metrics::add_connected(-1.0);
            sender_task.abort();
            return;
        }
    };

    // Resolve identity from the init parameters. A missing or invalid
    // credential degrades to an anonymous connection; the transport is
    // never failed for it.
    if let Some(token) = extract_token(&init_params) {
        match state.credentials.verify_subject(&token) {
            Ok((user_id, _)) => {
                session.authenticate(user_id);
                metrics::add_authenticated(1.0);
                tracing::info!(
                    connection_id = %connection_id,
                    user_id = %user_id,
                    "WebSocket connection authenticated"
                );
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Invalid connection credential, proceeding unauthenticated"
                );
            }
        }
    } else {
        tracing::debug!(connection_id = %connection_id, "WebSocket connected without credential");
    }

    if tx
        .send(ServerFrame::ConnectionAck {
            authenticated: session.is_authenticated(),
        })
        .is_err()
    {
        release(&mut session, sender_task);
        return;
    }

    // Main frame loop
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Subscribe { chat_id }) => {
                        handle_subscribe(&state, &mut session, chat_id, &tx).await;
                    }
                    Ok(ClientFrame::Unsubscribe { chat_id }) => {
                        session.remove_subscription(chat_id);
                        let _ = tx.send(ServerFrame::Unsubscribed { chat_id });
                    }
                    Ok(ClientFrame::Ping) => {
                        let _ = tx.send(ServerFrame::Pong);
                    }
                    Ok(ClientFrame::ConnectionInit { .. }) => {
                        // Identity is resolved once per connection
                        tracing::debug!(
                            connection_id = %connection_id,
                            "Duplicate connection_init ignored"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "Bad frame");
                        let _ = tx.send(ServerFrame::Error {
                            code: GatewayErrorCode::InvalidRequest,
                            message: "Unrecognized frame".into(),
                        });
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Connection closed");
                break;
            }
            Ok(_) => {
                // Binary/ping/pong frames are ignored; axum answers pings
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    release(&mut session, sender_task);
    tracing::debug!(connection_id = %connection_id, "WebSocket connection released");
}

/// Wait for the connection_init frame, ignoring anything else before it.
async fn wait_for_init(
    receiver: &mut SplitStream<WebSocket>,
) -> Option<std::collections::HashMap<String, serde_json::Value>> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(ClientFrame::ConnectionInit { params }) =
                    serde_json::from_str::<ClientFrame>(&text)
                {
                    return Some(params);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => continue,
        }
    }
    None
}

/// Authorize and register a chat subscription for this connection.
async fn handle_subscribe(
    state: &AppState,
    session: &mut ConnectionSession,
    chat_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) {
    // Identity-gated: anonymous connections fail here, not at connect time
    let Some(user_id) = session.identity() else {
        let _ = tx.send(ServerFrame::Error {
            code: GatewayErrorCode::AuthenticationError,
            message: "Authentication required".into(),
        });
        return;
    };

    let chat_repo = Arc::new(PgChatRepository::new(state.db.clone()));
    let guard = MembershipGuardImpl::new(chat_repo);

    match guard.is_participant(user_id, chat_id).await {
        Ok(true) => {}
        Ok(false) => {
            let _ = tx.send(ServerFrame::Error {
                code: GatewayErrorCode::Forbidden,
                message: "You are not a participant of this chat".into(),
            });
            return;
        }
        Err(GuardError::ChatNotFound) => {
            let _ = tx.send(ServerFrame::Error {
                code: GatewayErrorCode::NotFound,
                message: "Chat not found".into(),
            });
            return;
        }
        Err(GuardError::Internal(e)) => {
            tracing::error!(chat_id = %chat_id, error = %e, "Subscription authorization failed");
            let _ = tx.send(ServerFrame::Error {
                code: GatewayErrorCode::Internal,
                message: "Internal server error".into(),
            });
            return;
        }
    }

    // Re-subscribing to the same chat is idempotent
    if session.is_subscribed(chat_id) {
        let _ = tx.send(ServerFrame::Subscribed { chat_id });
        return;
    }

    let mut subscription = state.event_bus.subscribe(&chat_topic(chat_id));
    let frame_tx = tx.clone();
    let connection_id = session.connection_id;

    let task = tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(payload) => {
                    if frame_tx
                        .send(ServerFrame::Message { chat_id, payload })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        chat_id = %chat_id,
                        skipped = skipped,
                        "Subscription lagged, events dropped"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    session.add_subscription(chat_id, task);
    let _ = tx.send(ServerFrame::Subscribed { chat_id });

    tracing::debug!(
        connection_id = %session.connection_id,
        chat_id = %chat_id,
        "Subscription registered"
    );
}

/// Tear down connection state: subscriptions, metrics, sender task.
fn release(session: &mut ConnectionSession, sender_task: tokio::task::JoinHandle<()>) {
    if session.is_authenticated() {
        metrics::add_authenticated(-1.0);
    }
    metrics::add_connected(-1.0);
    session.close();
    sender_task.abort();
}
