use thiserror::Error;

use crate::contract::model::Role;
use crate::domain::access::DenyReason;
use crate::domain::token::TokenError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: i32 },

    #[error("No user with email '{email}'")]
    EmailNotFound { email: String },

    #[error("No users with role {role}")]
    NoUsersWithRole { role: Role },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name too long: {len} characters (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Password must be between {min} and {max} characters")]
    InvalidPassword { min: usize, max: usize },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: DenyReason },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Password hashing error: {message}")]
    Hashing { message: String },

    #[error("Token error: {message}")]
    Token { message: String },
}

impl DomainError {
    pub fn user_not_found(id: i32) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_not_found(email: impl Into<String>) -> Self {
        Self::EmailNotFound {
            email: email.into(),
        }
    }

    pub fn no_users_with_role(role: Role) -> Self {
        Self::NoUsersWithRole { role }
    }

    pub fn email_already_exists(email: String) -> Self {
        Self::EmailAlreadyExists { email }
    }

    pub fn invalid_email(email: String) -> Self {
        Self::InvalidEmail { email }
    }

    pub fn empty_name() -> Self {
        Self::EmptyName
    }

    pub fn name_too_long(len: usize, max: usize) -> Self {
        Self::NameTooLong { len, max }
    }

    pub fn invalid_password(min: usize, max: usize) -> Self {
        Self::InvalidPassword { min, max }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: DenyReason) -> Self {
        Self::Forbidden { reason }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            message: message.into(),
        }
    }
}

impl From<TokenError> for DomainError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired | TokenError::InvalidSignature | TokenError::Malformed(_) => {
                Self::unauthenticated(e.to_string())
            }
            TokenError::MissingSecret | TokenError::Signing(_) => Self::token(e.to_string()),
        }
    }
}
