//! Signed, time-limited identity tokens (HS256 JWT).

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::model::{Role, User};

/// Environment variable holding the process-wide signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret is not configured ({JWT_SECRET_ENV} is missing or empty)")]
    MissingSecret,

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and verifies access tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Build from the `JWT_SECRET` environment variable.
    pub fn from_env(ttl: Duration) -> Result<Self, TokenError> {
        let secret = std::env::var(JWT_SECRET_ENV).map_err(|_| TokenError::MissingSecret)?;
        Self::new(&secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a fresh token for `user`, valid for the configured ttl from now.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat,
            exp: iat.saturating_add(ttl),
        };
        self.sign(&claims)
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            role: Role::User,
            created_at: now,
            updated_at: now,
        }
    }

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret, Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn issued_token_carries_user_claims() {
        let issuer = issuer("test-secret");
        let token = issuer.issue(&user()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "john@example.com");
        assert_eq!(claims.name, "John Doe");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(
            TokenIssuer::new("", Duration::from_secs(60)).unwrap_err(),
            TokenError::MissingSecret
        );
        assert_eq!(
            TokenIssuer::new("   ", Duration::from_secs(60)).unwrap_err(),
            TokenError::MissingSecret
        );
    }

    #[test]
    fn token_signed_with_other_secret_fails_signature_check() {
        let token = issuer("secret-a").issue(&user()).unwrap();
        assert_eq!(
            issuer("secret-b").verify(&token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = issuer("test-secret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: 1,
            email: "a@b.co".to_string(),
            name: "A".to_string(),
            role: Role::Admin,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = issuer.sign(&claims).unwrap();
        assert_eq!(issuer.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = issuer("test-secret").verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }
}
