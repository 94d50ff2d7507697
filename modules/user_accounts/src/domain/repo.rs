use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::model::{Role, User};

/// Full stored record, including credential material. Never leaves the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: Option<String>,
    pub access_token: Option<String>,
}

/// Row to insert. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column changes for an update; `None` leaves a column untouched.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub updated_at: DateTime<Utc>,
}

/// Raised by repositories when the store rejects a write on a unique index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unique constraint violated on {field}")]
pub struct UniqueViolation {
    pub field: &'static str,
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>>;
    /// Load the full record (hash and cached token included) by email.
    async fn find_record_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    /// Id of the user currently holding `email`, if any.
    async fn email_owner(&self, email: &str) -> anyhow::Result<Option<i32>>;
    /// Insert a new row and return it with its assigned id.
    ///
    /// Fails with [`UniqueViolation`] inside the `anyhow::Error` on a duplicate email.
    async fn insert(&self, new: NewUserRecord) -> anyhow::Result<User>;
    /// Apply changes to an existing row. Returns `None` if the row is gone.
    async fn update(&self, id: i32, changes: UserChanges) -> anyhow::Result<Option<User>>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: i32) -> anyhow::Result<bool>;
    /// All users, optionally restricted to one role, ordered by id.
    async fn list(&self, role: Option<Role>) -> anyhow::Result<Vec<User>>;
    /// Cache the last issued access token on the row (last write wins).
    async fn set_access_token(&self, id: i32, token: Option<String>) -> anyhow::Result<()>;
}
