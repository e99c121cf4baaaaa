//! Authentication Service
//!
//! Handles user registration, login and token issuance.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{User, UserRepository};

use super::credential_service::CredentialService;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and issue a token
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError>;

    /// Authenticate user with credentials and issue a token
    async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError>;

    /// Get the current user for a verified identity
    async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError>;
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailExists,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// AuthService implementation
pub struct AuthServiceImpl<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    credentials: Arc<CredentialService>,
}

impl<U> AuthServiceImpl<U>
where
    U: UserRepository,
{
    /// Create a new AuthServiceImpl
    pub fn new(user_repo: Arc<U>, credentials: Arc<CredentialService>) -> Self {
        Self {
            user_repo,
            credentials,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[async_trait]
impl<U> AuthService for AuthServiceImpl<U>
where
    U: UserRepository + 'static,
{
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = email.trim().to_lowercase();
        let username = username.trim().to_string();

        // Check if email already exists
        if self
            .user_repo
            .email_exists(&email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::EmailExists);
        }

        // Check if username already exists
        if self
            .user_repo
            .username_exists(&username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::UsernameExists);
        }

        // Hash password
        let password_hash = self.hash_password(password)?;

        // Create user
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        let created_user = self
            .user_repo
            .create(&user)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let token = self
            .credentials
            .sign(created_user.id, &created_user.email)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok((created_user, token))
    }

    async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = email.trim().to_lowercase();

        // Unknown user and bad password yield the same error so the
        // response never reveals whether the account exists.
        let user = self
            .user_repo
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .credentials
            .sign(user.id, &user.email)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok((user, token))
    }

    async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::JwtSettings;
    use crate::domain::MockUserRepository;

    fn test_credentials() -> Arc<CredentialService> {
        Arc::new(CredentialService::new(JwtSettings {
            secret: "test-secret-that-is-at-least-32-chars!!".into(),
            token_expiry_days: 7,
        }))
    }

    #[tokio::test]
    async fn test_register_issues_verifiable_token() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_email_exists().returning(|_| Ok(false));
        user_repo.expect_username_exists().returning(|_| Ok(false));
        user_repo.expect_create().returning(|u| Ok(u.clone()));

        let credentials = test_credentials();
        let service = AuthServiceImpl::new(Arc::new(user_repo), credentials.clone());

        let (user, token) = service
            .register("Alice", "Alice@Example.COM", "secret123")
            .await
            .unwrap();

        // Email is normalized, username trimmed
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.username, "Alice");

        let (subject, claims) = credentials.verify_subject(&token).unwrap();
        assert_eq!(subject, user.id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_email_exists().returning(|_| Ok(true));

        let service = AuthServiceImpl::new(Arc::new(user_repo), test_credentials());
        let result = service
            .register("alice", "alice@example.com", "secret123")
            .await;

        assert!(matches!(result, Err(AuthError::EmailExists)));
    }

    #[tokio::test]
    async fn test_login_unknown_user_and_bad_password_are_indistinguishable() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_email_exists().returning(|_| Ok(false));
        user_repo.expect_username_exists().returning(|_| Ok(false));
        user_repo.expect_create().returning(|u| Ok(u.clone()));

        let service = AuthServiceImpl::new(Arc::new(user_repo), test_credentials());
        let (user, _) = service
            .register("alice", "alice@example.com", "secret123")
            .await
            .unwrap();

        // Repo that knows only alice
        let mut user_repo = MockUserRepository::new();
        let known = user.clone();
        user_repo.expect_find_by_email().returning(move |email| {
            if email == known.email {
                Ok(Some(known.clone()))
            } else {
                Ok(None)
            }
        });

        let service = AuthServiceImpl::new(Arc::new(user_repo), test_credentials());

        let unknown = service.login("nobody@example.com", "secret123").await;
        let bad_password = service.login("alice@example.com", "wrong-password").await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(bad_password, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_succeeds_with_correct_password() {
        let mut create_repo = MockUserRepository::new();
        create_repo.expect_email_exists().returning(|_| Ok(false));
        create_repo.expect_username_exists().returning(|_| Ok(false));
        create_repo.expect_create().returning(|u| Ok(u.clone()));

        let service = AuthServiceImpl::new(Arc::new(create_repo), test_credentials());
        let (user, _) = service
            .register("alice", "alice@example.com", "secret123")
            .await
            .unwrap();

        let mut login_repo = MockUserRepository::new();
        let known = user.clone();
        login_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(known.clone())));

        let service = AuthServiceImpl::new(Arc::new(login_repo), test_credentials());
        let (logged_in, token) = service.login("alice@example.com", "secret123").await.unwrap();

        assert_eq!(logged_in.id, user.id);
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_current_user_missing_account() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = AuthServiceImpl::new(Arc::new(user_repo), test_credentials());
        let result = service.current_user(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }
}
