//! Topic-keyed multicast event bus.
//!
//! A minimal in-process publish/subscribe register. Each topic maps to a
//! broadcast channel; publishing delivers to every receiver registered at
//! that moment, and receivers registered afterwards never see earlier
//! payloads. Topics with zero listeners discard published payloads.
//!
//! The bus is an explicitly owned component: it lives in `AppState` and is
//! passed by reference to everything that publishes or subscribes.

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default per-topic channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Topic name for a chat's message events.
pub fn chat_topic(chat_id: Uuid) -> String {
    format!("chat:{}", chat_id)
}

/// Topic-keyed publish/subscribe router.
///
/// Registry mutations are short-held DashMap shard operations and never
/// span an await point.
pub struct EventBus<T: Clone> {
    topics: DashMap<String, broadcast::Sender<T>>,
    capacity: usize,
}

impl<T: Clone> EventBus<T> {
    /// Create a bus with the given per-topic channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    /// Publish a payload to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers the payload was delivered to.
    /// Zero subscribers is not an error: the payload is silently dropped
    /// and the empty topic is pruned from the registry.
    pub fn publish(&self, topic: &str, payload: T) -> usize {
        let delivered = match self.topics.get(topic) {
            Some(tx) => tx.send(payload).unwrap_or(0),
            None => return 0,
        };

        if delivered == 0 {
            self.topics
                .remove_if(topic, |_, tx| tx.receiver_count() == 0);
        }

        delivered
    }

    /// Open a subscription on `topic`, starting from "now".
    ///
    /// The returned handle yields only payloads published after this call;
    /// there is no buffering or replay of history. Dropping the handle
    /// unsubscribes.
    pub fn subscribe(&self, topic: &str) -> TopicSubscription<T> {
        let capacity = self.capacity;
        let rx = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe();

        TopicSubscription {
            topic: topic.to_string(),
            rx,
        }
    }

    /// Number of live subscribers on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// A live registration on one topic.
///
/// Conceptually a lazy, unbounded sequence of future payloads. Dropping
/// the subscription removes the registration; dropping twice is trivially
/// idempotent.
pub struct TopicSubscription<T: Clone> {
    topic: String,
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> TopicSubscription<T> {
    /// The topic this subscription is registered on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next payload.
    ///
    /// Returns `RecvError::Closed` when the bus side is gone and
    /// `RecvError::Lagged(n)` when this subscriber fell more than the
    /// channel capacity behind and lost `n` payloads.
    pub async fn recv(&mut self) -> Result<T, broadcast::error::RecvError> {
        self.rx.recv().await
    }
}
