//! Login and bearer-token authentication on top of the user service.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::access::{authorize, ActionPolicy, Decision, Principal};
use crate::domain::error::DomainError;
use crate::domain::service::Service;
use crate::domain::token::TokenIssuer;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<Service>,
    tokens: TokenIssuer,
    persist_access_token: bool,
}

impl AuthService {
    pub fn new(users: Arc<Service>, tokens: TokenIssuer, persist_access_token: bool) -> Self {
        Self {
            users,
            tokens,
            persist_access_token,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Exchange credentials for a signed access token.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    #[instrument(name = "user_accounts.service.login", skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DomainError> {
        let record = match self.users.find_by_email(email).await {
            Ok(record) => record,
            Err(DomainError::EmailNotFound { .. }) => {
                // Same hashing work as a wrong password, so timing does not reveal the account.
                self.users.passwords().verify_placeholder(password).await;
                debug!("Login attempt for unknown email");
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let passwords = self.users.passwords();
        let verified = match record.password_hash.as_deref() {
            Some(hash) if !hash.is_empty() => passwords.verify(password, Some(hash)).await,
            _ => passwords.verify_placeholder(password).await,
        };
        if !verified {
            debug!(user_id = record.user.id, "Login attempt with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.tokens.issue(&record.user)?;

        if self.persist_access_token {
            self.users.store_access_token(record.user.id, &token).await?;
        }

        info!(user_id = record.user.id, "User logged in");
        Ok(token)
    }

    /// Verify a bearer token and return the caller it identifies.
    pub fn authenticate(&self, token: &str) -> Result<Principal, DomainError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!(reason = %e, "Bearer token rejected");
            DomainError::from(e)
        })?;
        Ok(Principal::from(claims))
    }

    /// Run the access guard, turning a denial into `Forbidden`.
    pub fn authorize(
        &self,
        principal: &Principal,
        policy: &ActionPolicy,
        owner: Option<i32>,
    ) -> Result<(), DomainError> {
        match authorize(principal, policy, owner) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    action = policy.name,
                    principal_id = principal.id,
                    reason = reason.as_str(),
                    "Access denied"
                );
                Err(DomainError::forbidden(reason))
            }
        }
    }
}
