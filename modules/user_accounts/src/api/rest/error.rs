use std::convert::Infallible;

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    FromRequestParts,
};
use axum::http::request::Parts;
use http_problem::{ProblemResponse, ValidationError};

use crate::domain::access::DenyReason;
use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request data stamped onto every problem document.
#[derive(Debug, Clone, Default)]
pub struct ProblemCtx {
    pub instance: String,
    pub request_id: Option<String>,
}

impl ProblemCtx {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            request_id: None,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            instance: parts.uri.path().to_owned(),
            request_id: parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        }
    }
}

impl<S> FromRequestParts<S> for ProblemCtx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Build a ProblemResponse from a catalog entry
pub fn from_code(code: ErrorCode, detail: impl Into<String>, ctx: &ProblemCtx) -> ProblemResponse {
    let mut problem = code.to_problem(detail).with_instance(ctx.instance.as_str());
    if let Some(ref id) = ctx.request_id {
        problem = problem.with_request_id(id.as_str());
    }
    ProblemResponse(problem)
}

fn field_error(code: ErrorCode, field: &str, detail: String, ctx: &ProblemCtx) -> ProblemResponse {
    let ProblemResponse(problem) = from_code(code, detail.clone(), ctx);
    ProblemResponse(problem.with_errors(vec![ValidationError {
        detail,
        pointer: format!("/{field}"),
    }]))
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, ctx: &ProblemCtx) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { .. } | DomainError::EmailNotFound { .. } => from_code(
            ErrorCode::user_accounts_user_not_found_v1,
            "User not found",
            ctx,
        ),
        DomainError::NoUsersWithRole { role } => from_code(
            ErrorCode::user_accounts_user_not_found_v1,
            format!("No users with role {role}"),
            ctx,
        ),
        DomainError::EmailAlreadyExists { .. } => from_code(
            ErrorCode::user_accounts_user_email_conflict_v1,
            "A user with this email already exists.",
            ctx,
        ),
        DomainError::InvalidEmail { .. } => field_error(
            ErrorCode::user_accounts_user_invalid_email_v1,
            "email",
            e.to_string(),
            ctx,
        ),
        DomainError::EmptyName | DomainError::NameTooLong { .. } => field_error(
            ErrorCode::user_accounts_user_validation_v1,
            "name",
            e.to_string(),
            ctx,
        ),
        DomainError::InvalidPassword { .. } => field_error(
            ErrorCode::user_accounts_user_validation_v1,
            "password",
            e.to_string(),
            ctx,
        ),
        DomainError::Validation { field, message } => field_error(
            ErrorCode::user_accounts_user_validation_v1,
            field,
            message.clone(),
            ctx,
        ),
        DomainError::InvalidCredentials => from_code(
            ErrorCode::user_accounts_auth_invalid_credentials_v1,
            "Invalid email or password",
            ctx,
        ),
        DomainError::Unauthenticated { .. } => from_code(
            ErrorCode::user_accounts_auth_unauthenticated_v1,
            "A valid bearer token is required",
            ctx,
        ),
        DomainError::Forbidden { reason } => {
            let code = match reason {
                DenyReason::WrongRole => ErrorCode::user_accounts_access_wrong_role_v1,
                DenyReason::NotOwner => ErrorCode::user_accounts_access_not_owner_v1,
                DenyReason::OperationNotPermitted => {
                    ErrorCode::user_accounts_access_operation_not_permitted_v1
                }
                DenyReason::SelfDeletion => ErrorCode::user_accounts_access_self_deletion_v1,
            };
            from_code(code, reason.to_string(), ctx)
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_code(
                ErrorCode::user_accounts_internal_database_v1,
                "An internal database error occurred",
                ctx,
            )
        }
        DomainError::Hashing { .. } | DomainError::Token { .. } => {
            tracing::error!(error = ?e, "Internal error occurred");
            from_code(
                ErrorCode::user_accounts_internal_v1,
                "An internal error occurred",
                ctx,
            )
        }
    }
}

/// Malformed or mistyped JSON bodies are client errors (400), including unknown roles.
pub fn map_json_rejection(rejection: &JsonRejection, ctx: &ProblemCtx) -> ProblemResponse {
    from_code(
        ErrorCode::user_accounts_user_validation_v1,
        rejection.body_text(),
        ctx,
    )
}

/// Non-numeric or out-of-range ids in the path are client errors (400).
pub fn map_path_rejection(rejection: &PathRejection, ctx: &ProblemCtx) -> ProblemResponse {
    field_error(
        ErrorCode::user_accounts_user_validation_v1,
        "id",
        rejection.body_text(),
        ctx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn ctx() -> ProblemCtx {
        ProblemCtx {
            instance: "/users/5".to_string(),
            request_id: Some("req-1".to_string()),
        }
    }

    #[test]
    fn forbidden_reasons_map_to_distinct_codes() {
        let self_delete = map_domain_error(&DomainError::forbidden(DenyReason::SelfDeletion), &ctx());
        let not_owner = map_domain_error(&DomainError::forbidden(DenyReason::NotOwner), &ctx());
        assert_eq!(self_delete.0.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(not_owner.0.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(self_delete.0.code, not_owner.0.code);
        assert_eq!(self_delete.0.code, "user_accounts.access.self_deletion.v1");
    }

    #[test]
    fn problem_carries_instance_and_request_id() {
        let resp = map_domain_error(&DomainError::user_not_found(5), &ctx());
        assert_eq!(resp.0.status, 404);
        assert_eq!(resp.0.instance, "/users/5");
        assert_eq!(resp.0.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn validation_errors_point_at_the_field() {
        let resp = map_domain_error(&DomainError::invalid_password(8, 20), &ProblemCtx::new("/users"));
        assert_eq!(resp.0.status, 400);
        let errors = resp.0.errors.expect("field errors");
        assert_eq!(errors[0].pointer, "/password");
        assert!(resp.0.request_id.is_none());
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let resp = map_domain_error(&DomainError::database("connection refused at 10.0.0.3"), &ctx());
        assert_eq!(resp.0.status, 500);
        assert!(!resp.0.detail.contains("10.0.0.3"));
    }

    #[test]
    fn auth_failures_are_401() {
        let a = map_domain_error(&DomainError::InvalidCredentials, &ctx());
        let b = map_domain_error(&DomainError::unauthenticated("token has expired"), &ctx());
        assert_eq!(a.0.status, 401);
        assert_eq!(b.0.status, 401);
    }
}
