#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

use user_accounts::config::UserAccountsConfig;
use user_accounts::contract::model::{NewUser, Role};
use user_accounts::domain::password::PasswordAlgorithm;
use user_accounts::domain::token::TokenIssuer;
use user_accounts::UserAccounts;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "password123";

/// Create a fresh in-memory database with migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    // One connection: every pooled connection to `:memory:` would be a separate database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");

    UserAccounts::migrate(&db)
        .await
        .expect("Failed to run migrations");

    db
}

/// Low bcrypt cost keeps hashing fast in tests.
pub fn test_config() -> UserAccountsConfig {
    UserAccountsConfig {
        password_algorithm: PasswordAlgorithm::Bcrypt,
        bcrypt_cost: 4,
        ..UserAccountsConfig::default()
    }
}

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_SECRET, Duration::from_secs(3600)).expect("valid secret")
}

pub async fn create_test_module_with(cfg: UserAccountsConfig) -> UserAccounts {
    let db = create_test_db().await;
    UserAccounts::new(db, &cfg, test_issuer())
}

pub async fn create_test_module() -> UserAccounts {
    create_test_module_with(test_config()).await
}

pub async fn create_test_router() -> (UserAccounts, Router) {
    let module = create_test_module().await;
    let router = module.register_rest(Router::new());
    (module, router)
}

pub fn new_user(name: &str, email: &str, role: Role) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role,
    }
}

/// Send one request through the router and decode the JSON body (Null when empty).
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register through the API and log in, returning (id, token).
pub async fn register_and_login(router: &Router, name: &str, email: &str, role: &str) -> (i64, String) {
    let (status, body) = send(
        router,
        Method::POST,
        "/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let id = body["id"].as_i64().expect("id in register response");

    let token = login(router, email, PASSWORD).await;
    (id, token)
}

pub async fn login(router: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"]
        .as_str()
        .expect("access_token in login response")
        .to_string()
}
