//! Credential Service
//!
//! Issues and verifies the bearer tokens that carry a subject identity.
//! HTTP middleware, the auth service and the WebSocket gateway all verify
//! through this one component, so "who is this token" has a single answer
//! everywhere.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email of the subject
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Credential verification errors.
///
/// Callers at API boundaries collapse both variants into a single
/// authentication failure so a remote party cannot distinguish a bad
/// signature from an expired token or a missing account.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Signs and verifies bearer tokens.
pub struct CredentialService {
    settings: JwtSettings,
}

impl CredentialService {
    /// Create a new CredentialService from JWT settings.
    pub fn new(settings: JwtSettings) -> Self {
        Self { settings }
    }

    /// Sign a token for the given subject.
    pub fn sign(&self, user_id: Uuid, email: &str) -> Result<String, CredentialError> {
        let now = Utc::now();
        let expiry = now + Duration::days(self.settings.token_expiry_days);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.secret.as_bytes()),
        )
        .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::Invalid,
        })?;

        Ok(token_data.claims)
    }

    /// Verify a token and parse the subject as a user ID.
    pub fn verify_subject(&self, token: &str) -> Result<(Uuid, Claims), CredentialError> {
        let claims = self.verify(token)?;
        let user_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| CredentialError::Invalid)?;

        Ok((user_id, claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(expiry_days: i64) -> CredentialService {
        CredentialService::new(JwtSettings {
            secret: "test-secret-that-is-at-least-32-chars!!".into(),
            token_expiry_days: expiry_days,
        })
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let service = test_service(7);
        let user_id = Uuid::new_v4();

        let token = service.sign(user_id, "alice@example.com").unwrap();
        let (subject, claims) = service.verify_subject(&token).unwrap();

        assert_eq!(subject, user_id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let service = test_service(7);
        let token = service.sign(Uuid::new_v4(), "alice@example.com").unwrap();

        let mut tampered = token.clone();
        tampered.push('x');

        assert!(matches!(
            service.verify(&tampered),
            Err(CredentialError::Invalid)
        ));
    }

    #[test]
    fn test_verify_rejects_token_from_other_secret() {
        let service = test_service(7);
        let other = CredentialService::new(JwtSettings {
            secret: "a-different-secret-also-32-chars-long!!!".into(),
            token_expiry_days: 7,
        });

        let token = other.sign(Uuid::new_v4(), "alice@example.com").unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(CredentialError::Invalid)
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let service = test_service(-1);
        let token = service.sign(Uuid::new_v4(), "alice@example.com").unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(CredentialError::Expired)
        ));
    }

    #[test]
    fn test_verify_subject_rejects_non_uuid_subject() {
        let service = test_service(7);
        // Forge a token whose sub is not a UUID
        let claims = Claims {
            sub: "not-a-uuid".into(),
            email: "alice@example.com".into(),
            exp: (Utc::now() + Duration::days(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-that-is-at-least-32-chars!!".as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service.verify_subject(&token),
            Err(CredentialError::Invalid)
        ));
    }
}
