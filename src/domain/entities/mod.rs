//! # Domain Entities
//!
//! Core domain entities representing the main business objects in the chat
//! backend. All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **User**: User account with authentication data and profile
//! - **Chat**: A conversation (direct or group) with an immutable participant set
//! - **Message**: A text and/or image message sent into a chat
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle.

mod chat;
mod message;
mod user;

// Re-export User entity and related types
pub use user::{User, UserRepository};

// Re-export Chat entity and related types
pub use chat::{Chat, ChatRepository, ChatType};

// Re-export Message entity and related types
pub use message::{Message, MessageRepository};

#[cfg(test)]
pub use chat::MockChatRepository;
#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use user::MockUserRepository;
