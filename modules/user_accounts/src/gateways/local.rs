use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UserAccountsApi,
    error::UserAccountsError,
    model::{NewUser, Role, User, UserPatch},
};
use crate::domain::{auth::AuthService, error::DomainError, service::Service};

/// Local implementation of the UserAccountsApi trait that delegates to the domain services
pub struct UserAccountsLocalClient {
    service: Arc<Service>,
    auth: Arc<AuthService>,
}

impl UserAccountsLocalClient {
    pub fn new(service: Arc<Service>, auth: Arc<AuthService>) -> Self {
        Self { service, auth }
    }
}

#[async_trait]
impl UserAccountsApi for UserAccountsLocalClient {
    async fn get_user(&self, id: i32) -> anyhow::Result<User> {
        self.service
            .get_user(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn list_users(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        self.service
            .list_users(role)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User> {
        self.service
            .create_user(new_user)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn update_user(&self, id: i32, patch: UserPatch) -> anyhow::Result<User> {
        self.service
            .update_user(id, patch)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn delete_user(&self, id: i32) -> anyhow::Result<User> {
        self.service
            .delete_user(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn login(&self, email: &str, password: &str) -> anyhow::Result<String> {
        self.auth
            .login(email, password)
            .await
            .map_err(map_domain_error_to_anyhow)
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn map_domain_error_to_anyhow(domain_error: DomainError) -> anyhow::Error {
    let contract_error = match domain_error {
        DomainError::UserNotFound { id } => UserAccountsError::not_found(id.to_string()),
        DomainError::EmailNotFound { email } => UserAccountsError::not_found(email),
        DomainError::NoUsersWithRole { role } => {
            UserAccountsError::not_found(format!("role {role}"))
        }
        DomainError::EmailAlreadyExists { email } => UserAccountsError::conflict(email),
        e @ (DomainError::InvalidEmail { .. }
        | DomainError::EmptyName
        | DomainError::NameTooLong { .. }
        | DomainError::InvalidPassword { .. }
        | DomainError::Validation { .. }) => UserAccountsError::validation(e.to_string()),
        DomainError::InvalidCredentials => UserAccountsError::InvalidCredentials,
        DomainError::Unauthenticated { .. } => UserAccountsError::Unauthenticated,
        DomainError::Forbidden { reason } => UserAccountsError::forbidden(reason.to_string()),
        DomainError::Database { .. } | DomainError::Hashing { .. } | DomainError::Token { .. } => {
            UserAccountsError::internal()
        }
    };

    anyhow::Error::new(contract_error)
}
