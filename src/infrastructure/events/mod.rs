//! In-Process Event Bus
//!
//! Topic-keyed publish/subscribe fan-out for real-time delivery.

pub mod event_bus;

pub use event_bus::{chat_topic, EventBus, TopicSubscription};
