use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::UserAccountsConfig;
use crate::contract::client::UserAccountsApi;
use crate::domain::auth::AuthService;
use crate::domain::password::PasswordVerifier;
use crate::domain::service::{Service, ServiceConfig};
use crate::domain::token::TokenIssuer;
use crate::gateways::local::UserAccountsLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmUsersRepository;

/// Wired user_accounts module: domain services plus their REST and in-process surfaces.
#[derive(Clone)]
pub struct UserAccounts {
    service: Arc<Service>,
    auth: Arc<AuthService>,
}

impl UserAccounts {
    /// Wire repository (infra) to domain services using an explicit token issuer.
    pub fn new(db: DatabaseConnection, cfg: &UserAccountsConfig, tokens: TokenIssuer) -> Self {
        debug!(
            "Loaded user_accounts config: token_ttl_secs={}, password_algorithm={:?}, persist_access_token={}",
            cfg.token_ttl_secs, cfg.password_algorithm, cfg.persist_access_token
        );

        let repo = SeaOrmUsersRepository::new(db);
        let passwords = PasswordVerifier::new(cfg.password_algorithm, cfg.bcrypt_cost);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let passwords = passwords.clone();
            handle.spawn(async move { passwords.prepare_placeholder().await });
        }
        let service_config = ServiceConfig {
            max_name_length: cfg.max_name_length,
            password_min_len: cfg.password_min_len,
            password_max_len: cfg.password_max_len,
        };
        let service = Arc::new(Service::new(Arc::new(repo), passwords, service_config));
        let auth = Arc::new(AuthService::new(
            service.clone(),
            tokens,
            cfg.persist_access_token,
        ));

        info!("user_accounts module initialized");
        Self { service, auth }
    }

    /// Same as [`UserAccounts::new`], reading the signing secret from `JWT_SECRET`.
    pub fn from_env(db: DatabaseConnection, cfg: &UserAccountsConfig) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::from_env(Duration::from_secs(cfg.token_ttl_secs))
            .context("cannot start user_accounts without a signing secret")?;
        Ok(Self::new(db, cfg, tokens))
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running user_accounts database migrations");
        Migrator::up(db, None)
            .await
            .context("user_accounts migrations failed")?;
        info!("user_accounts database migrations completed successfully");
        Ok(())
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering user_accounts REST routes");
        routes::register_routes(router, self.service.clone(), self.auth.clone())
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn UserAccountsApi> {
        Arc::new(UserAccountsLocalClient::new(
            self.service.clone(),
            self.auth.clone(),
        ))
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn auth(&self) -> Arc<AuthService> {
        self.auth.clone()
    }
}
