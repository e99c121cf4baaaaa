//! User Service
//!
//! User lookup and search.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::response::UserResponse;
use crate::domain::UserRepository;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: Uuid) -> Result<UserResponse, UserError>;

    /// Search users by username or email substring
    async fn search_users(&self, term: Option<&str>) -> Result<Vec<UserResponse>, UserError>;
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + 'static,
{
    async fn get_user(&self, id: Uuid) -> Result<UserResponse, UserError> {
        let user = self
            .user_repo
            .find_by_id(id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)?;

        Ok(UserResponse::from(user))
    }

    async fn search_users(&self, term: Option<&str>) -> Result<Vec<UserResponse>, UserError> {
        let users = self
            .user_repo
            .search(term)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
