//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **CredentialService**: Bearer token signing and verification
//! - **AuthService**: Registration, login, password management
//! - **MembershipGuard**: Chat membership authorization
//! - **UserService**: User lookup and search
//! - **ChatService**: Chat creation and listing
//! - **MessageService**: The message pipeline (validate, persist, enrich, publish)

pub mod auth_service;
pub mod chat_service;
pub mod credential_service;
pub mod membership_guard;
pub mod message_service;
pub mod user_service;

// Re-export credential service types
pub use credential_service::{Claims, CredentialError, CredentialService};

// Re-export auth service types
pub use auth_service::{AuthError, AuthService, AuthServiceImpl};

// Re-export membership guard types
pub use membership_guard::{GuardError, MembershipGuard, MembershipGuardImpl};

// Re-export user service types
pub use user_service::{UserError, UserService, UserServiceImpl};

// Re-export chat service types
pub use chat_service::{ChatError, ChatService, ChatServiceImpl};

// Re-export message service types
pub use message_service::{MessageError, MessageService, MessageServiceImpl};
