use async_trait::async_trait;

use crate::contract::model::{NewUser, Role, User, UserPatch};

/// Public API trait for the user_accounts module that other modules can use.
///
/// Calls here are trusted in-process calls: no access-control guard runs.
#[async_trait]
pub trait UserAccountsApi: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: i32) -> anyhow::Result<User>;

    /// List users, optionally restricted to one role
    async fn list_users(&self, role: Option<Role>) -> anyhow::Result<Vec<User>>;

    /// Register a new user
    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User>;

    /// Update a user with partial data
    async fn update_user(&self, id: i32, patch: UserPatch) -> anyhow::Result<User>;

    /// Delete a user by ID, returning the removed record
    async fn delete_user(&self, id: i32) -> anyhow::Result<User>;

    /// Exchange credentials for a signed access token
    async fn login(&self, email: &str, password: &str) -> anyhow::Result<String>;
}
