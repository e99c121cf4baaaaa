//! WebSocket Session Management
//!
//! Explicit per-connection session record: identity resolved once at
//! connect time, subscriptions owned per chat. Created when the socket is
//! accepted and passed into every subscription-bound operation.

use std::collections::HashMap;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Per-connection session state
#[derive(Debug)]
pub struct ConnectionSession {
    pub connection_id: Uuid,
    identity: Option<Uuid>,
    subscriptions: HashMap<Uuid, JoinHandle<()>>,
}

impl ConnectionSession {
    /// Create an anonymous session for a freshly accepted connection.
    pub fn new() -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            identity: None,
            subscriptions: HashMap::new(),
        }
    }

    /// Bind a verified identity to this connection.
    pub fn authenticate(&mut self, user_id: Uuid) {
        self.identity = Some(user_id);
    }

    /// The identity bound at connect time, if any.
    pub fn identity(&self) -> Option<Uuid> {
        self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether this connection already holds a subscription for the chat.
    pub fn is_subscribed(&self, chat_id: Uuid) -> bool {
        self.subscriptions.contains_key(&chat_id)
    }

    /// Register the forwarding task for a chat subscription.
    ///
    /// Replacing an existing subscription aborts the old task first.
    pub fn add_subscription(&mut self, chat_id: Uuid, task: JoinHandle<()>) {
        if let Some(old) = self.subscriptions.insert(chat_id, task) {
            old.abort();
        }
    }

    /// Remove a subscription, stopping delivery. Idempotent.
    pub fn remove_subscription(&mut self, chat_id: Uuid) -> bool {
        match self.subscriptions.remove(&chat_id) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Release all subscriptions; called when the connection closes.
    pub fn close(&mut self) {
        for (_, task) in self.subscriptions.drain() {
            task.abort();
        }
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_task() -> JoinHandle<()> {
        tokio::spawn(async {
            std::future::pending::<()>().await;
        })
    }

    #[tokio::test]
    async fn test_new_session_is_anonymous() {
        let session = ConnectionSession::new();

        assert!(!session.is_authenticated());
        assert!(session.identity().is_none());
        assert_eq!(session.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_binds_identity() {
        let mut session = ConnectionSession::new();
        let user_id = Uuid::new_v4();

        session.authenticate(user_id);

        assert!(session.is_authenticated());
        assert_eq!(session.identity(), Some(user_id));
    }

    #[tokio::test]
    async fn test_add_and_remove_subscription() {
        let mut session = ConnectionSession::new();
        let chat_id = Uuid::new_v4();

        session.add_subscription(chat_id, dummy_task());
        assert!(session.is_subscribed(chat_id));
        assert_eq!(session.subscription_count(), 1);

        assert!(session.remove_subscription(chat_id));
        assert!(!session.is_subscribed(chat_id));
        assert_eq!(session.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_subscription_is_idempotent() {
        let mut session = ConnectionSession::new();
        let chat_id = Uuid::new_v4();

        session.add_subscription(chat_id, dummy_task());
        assert!(session.remove_subscription(chat_id));
        assert!(!session.remove_subscription(chat_id));
    }

    #[tokio::test]
    async fn test_replacing_subscription_aborts_old_task() {
        let mut session = ConnectionSession::new();
        let chat_id = Uuid::new_v4();

        let first = dummy_task();
        let first_abort = first.abort_handle();
        session.add_subscription(chat_id, first);
        session.add_subscription(chat_id, dummy_task());

        // Abort lands asynchronously; give the scheduler a few turns
        let mut finished = first_abort.is_finished();
        for _ in 0..10 {
            if finished {
                break;
            }
            tokio::task::yield_now().await;
            finished = first_abort.is_finished();
        }
        assert!(finished);
        assert_eq!(session.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_close_releases_all_subscriptions() {
        let mut session = ConnectionSession::new();
        session.add_subscription(Uuid::new_v4(), dummy_task());
        session.add_subscription(Uuid::new_v4(), dummy_task());

        session.close();

        assert_eq!(session.subscription_count(), 0);
    }
}
