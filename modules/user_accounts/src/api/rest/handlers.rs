use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use http_problem::ProblemResponse;
use tracing::{error, info};

use crate::api::rest::dto::{
    CreateUserReq, ListUsersQuery, LoginReq, TokenDto, UpdateUserReq, UserDto,
};
use crate::api::rest::error::{
    from_code, map_domain_error, map_json_rejection, map_path_rejection, ProblemCtx,
};
use crate::api::rest::principal::AuthenticatedUser;
use crate::contract::model::Role;
use crate::domain::access::ActionPolicy;
use crate::domain::auth::AuthService;
use crate::domain::service::Service;
use crate::errors::ErrorCode;

/// List users, optionally filtered by `?role=USER|ADMIN`
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(policy): Extension<ActionPolicy>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ctx: ProblemCtx,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    auth.authorize(&principal, &policy, None)
        .map_err(|e| map_domain_error(&e, &ctx))?;

    let role = match query.role.as_deref().filter(|r| !r.is_empty()) {
        Some(raw) => Some(raw.parse::<Role>().map_err(|_| {
            from_code(
                ErrorCode::user_accounts_user_invalid_role_v1,
                "Valid Role Required",
                &ctx,
            )
        })?),
        None => None,
    };
    info!("Listing users with role filter: {:?}", role);

    match svc.list_users(role).await {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Get a specific user by ID
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(policy): Extension<ActionPolicy>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ctx: ProblemCtx,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Path(id) = path.map_err(|r| map_path_rejection(&r, &ctx))?;
    auth.authorize(&principal, &policy, Some(id))
        .map_err(|e| map_domain_error(&e, &ctx))?;
    info!("Getting user with id: {}", id);

    match svc.get_user(id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Register a new user. Public; also mounted as `POST /auth/register`.
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemCtx,
    payload: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    let Json(req) = payload.map_err(|r| map_json_rejection(&r, &ctx))?;
    info!("Creating user with email: {}", req.email);

    match svc.create_user(req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Update an existing user
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(policy): Extension<ActionPolicy>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ctx: ProblemCtx,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Path(id) = path.map_err(|r| map_path_rejection(&r, &ctx))?;
    auth.authorize(&principal, &policy, Some(id))
        .map_err(|e| map_domain_error(&e, &ctx))?;
    let Json(req) = payload.map_err(|r| map_json_rejection(&r, &ctx))?;
    info!("Updating user {}", id);

    match svc.update_user(id, req.into()).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Delete a user by ID, returning the removed record
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(policy): Extension<ActionPolicy>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ctx: ProblemCtx,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Path(id) = path.map_err(|r| map_path_rejection(&r, &ctx))?;
    auth.authorize(&principal, &policy, Some(id))
        .map_err(|e| map_domain_error(&e, &ctx))?;
    info!("Deleting user: {}", id);

    match svc.delete_user(id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Exchange email and password for an access token
pub async fn login(
    Extension(auth): Extension<Arc<AuthService>>,
    ctx: ProblemCtx,
    payload: Result<Json<LoginReq>, JsonRejection>,
) -> Result<Json<TokenDto>, ProblemResponse> {
    let Json(req) = payload.map_err(|r| map_json_rejection(&r, &ctx))?;

    match auth.login(&req.email, &req.password).await {
        Ok(access_token) => Ok(Json(TokenDto { access_token })),
        Err(e) => {
            info!("Login rejected: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}
