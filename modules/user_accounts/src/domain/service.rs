use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::contract::model::{NewUser, Role, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::password::PasswordVerifier;
use crate::domain::repo::{NewUserRecord, UniqueViolation, UserChanges, UserRecord, UsersRepository};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    passwords: PasswordVerifier,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub password_min_len: usize,
    pub password_max_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 100,
            password_min_len: 8,
            password_max_len: 20,
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        passwords: PasswordVerifier,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            passwords,
            config,
        }
    }

    pub fn passwords(&self) -> &PasswordVerifier {
        &self.passwords
    }

    #[instrument(
        name = "user_accounts.service.create_user",
        skip(self, new_user),
        fields(email = %new_user.email, role = %new_user.role)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        self.validate_new_user(&new_user)?;

        if self
            .repo
            .email_owner(&new_user.email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .is_some()
        {
            return Err(DomainError::email_already_exists(new_user.email));
        }

        let password_hash = self
            .passwords
            .hash(&new_user.password)
            .await
            .map_err(|e| DomainError::hashing(e.to_string()))?;

        let now = Utc::now();
        let email = new_user.email.clone();
        let user = self
            .repo
            .insert(NewUserRecord {
                name: new_user.name,
                email: new_user.email,
                password_hash,
                role: new_user.role,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| map_write_error(e, email))?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    /// All users, or only those with `role`. A role filter that matches
    /// nobody is reported as not found rather than as an empty list.
    #[instrument(name = "user_accounts.service.list_users", skip(self))]
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");

        let users = self
            .repo
            .list(role)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        if let Some(role) = role {
            if users.is_empty() {
                return Err(DomainError::no_users_with_role(role));
            }
        }

        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "user_accounts.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: i32) -> Result<User, DomainError> {
        debug!("Getting user by id");

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        debug!("Successfully retrieved user");
        Ok(user)
    }

    /// Full record for credential checks. Not exposed outside the module.
    #[instrument(name = "user_accounts.service.find_by_email", skip(self, email))]
    pub async fn find_by_email(&self, email: &str) -> Result<UserRecord, DomainError> {
        self.repo
            .find_record_by_email(email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::email_not_found(email))
    }

    #[instrument(
        name = "user_accounts.service.update_user",
        skip(self, patch),
        fields(user_id = %id)
    )]
    pub async fn update_user(&self, id: i32, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        self.validate_user_patch(&patch)?;

        let current = self.get_user(id).await?;

        // Keeping one's own email is not a conflict.
        if let Some(ref new_email) = patch.email {
            if new_email != &current.email {
                let owner = self
                    .repo
                    .email_owner(new_email)
                    .await
                    .map_err(|e| DomainError::database(e.to_string()))?;
                if matches!(owner, Some(other) if other != id) {
                    return Err(DomainError::email_already_exists(new_email.clone()));
                }
            }
        }

        let password_hash = match patch.password {
            Some(ref plaintext) => Some(
                self.passwords
                    .hash(plaintext)
                    .await
                    .map_err(|e| DomainError::hashing(e.to_string()))?,
            ),
            None => None,
        };

        let email = patch.email.clone().unwrap_or_default();
        let changes = UserChanges {
            name: patch.name,
            email: patch.email,
            password_hash,
            role: patch.role,
            updated_at: Utc::now(),
        };

        let user = self
            .repo
            .update(id, changes)
            .await
            .map_err(|e| map_write_error(e, email))?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        info!("Successfully updated user");
        Ok(user)
    }

    /// Delete a user and return the projection of the removed record.
    #[instrument(
        name = "user_accounts.service.delete_user",
        skip(self),
        fields(user_id = %id)
    )]
    pub async fn delete_user(&self, id: i32) -> Result<User, DomainError> {
        info!("Deleting user");

        let user = self.get_user(id).await?;

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        if !deleted {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully deleted user");
        Ok(user)
    }

    #[instrument(name = "user_accounts.service.store_access_token", skip(self, token), fields(user_id = %id))]
    pub async fn store_access_token(&self, id: i32, token: &str) -> Result<(), DomainError> {
        self.repo
            .set_access_token(id, Some(token.to_owned()))
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    // --- validation helpers ---

    fn validate_new_user(&self, new_user: &NewUser) -> Result<(), DomainError> {
        self.validate_name(&new_user.name)?;
        self.validate_email(&new_user.email)?;
        self.validate_password(&new_user.password)?;
        Ok(())
    }

    fn validate_user_patch(&self, patch: &UserPatch) -> Result<(), DomainError> {
        if let Some(ref name) = patch.name {
            self.validate_name(name)?;
        }
        if let Some(ref email) = patch.email {
            self.validate_email(email)?;
        }
        if let Some(ref password) = patch.password {
            self.validate_password(password)?;
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), DomainError> {
        if !is_valid_email(email) {
            return Err(DomainError::invalid_email(email.to_string()));
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::empty_name());
        }
        let len = name.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::name_too_long(len, self.config.max_name_length));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        let len = password.chars().count();
        if len < self.config.password_min_len || len > self.config.password_max_len {
            return Err(DomainError::invalid_password(
                self.config.password_min_len,
                self.config.password_max_len,
            ));
        }
        Ok(())
    }
}

/// Unique index hits on insert/update surface as conflicts, everything else as a DB failure.
fn map_write_error(e: anyhow::Error, email: String) -> DomainError {
    if e.downcast_ref::<UniqueViolation>().is_some() {
        DomainError::email_already_exists(email)
    } else {
        DomainError::database(e.to_string())
    }
}

/// `local@domain.tld` shape check: one `@`, no whitespace, dotted domain.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
