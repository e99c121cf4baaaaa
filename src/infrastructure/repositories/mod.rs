//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! This module provides concrete implementations of the repository traits
//! defined in the domain layer. Each repository handles data access for
//! a specific entity type.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - User account management
//! - **ChatRepository** - Chats and their participant sets
//! - **MessageRepository** - Message persistence and history queries

pub mod chat_repository;
pub mod message_repository;
pub mod user_repository;

// Re-export repository structs for convenience
pub use chat_repository::PgChatRepository;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
