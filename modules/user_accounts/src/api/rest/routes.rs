use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::access::{DELETE_USER, GET_USER, LIST_USERS, UPDATE_USER};
use crate::domain::auth::AuthService;
use crate::domain::service::Service;

/// Mount the user and auth routes.
///
/// Guarded routes carry their `ActionPolicy` as a per-route extension; the
/// handler authorizes against it after the bearer token is authenticated.
pub fn register_routes(router: Router, service: Arc<Service>, auth: Arc<AuthService>) -> Router {
    router
        // POST /users - public registration
        .route("/users", post(handlers::create_user))
        // GET /users?role= - admins only
        .route(
            "/users",
            get(handlers::list_users).layer(Extension(LIST_USERS)),
        )
        // GET /users/{id} - owner or admin
        .route(
            "/users/{id}",
            get(handlers::get_user).layer(Extension(GET_USER)),
        )
        // PATCH /users/{id} - owner or admin
        .route(
            "/users/{id}",
            patch(handlers::update_user).layer(Extension(UPDATE_USER)),
        )
        // DELETE /users/{id} - admins, never on themselves
        .route(
            "/users/{id}",
            delete(handlers::delete_user).layer(Extension(DELETE_USER)),
        )
        .route("/auth/register", post(handlers::create_user))
        .route("/auth/login", post(handlers::login))
        .layer(Extension(service))
        .layer(Extension(auth))
}
