//! Bearer-token authentication for REST handlers.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use http_problem::ProblemResponse;

use crate::api::rest::error::{map_domain_error, ProblemCtx};
use crate::domain::access::Principal;
use crate::domain::auth::AuthService;
use crate::domain::error::DomainError;

/// Caller identity resolved from `Authorization: Bearer <token>`.
///
/// Rejects with 401 before the handler runs when the token is missing,
/// expired or not signed with our secret.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = ProblemCtx::from_parts(parts);

        let Some(auth) = parts.extensions.get::<Arc<AuthService>>().cloned() else {
            tracing::error!("AuthService extension missing from router");
            return Err(map_domain_error(
                &DomainError::token("authentication is not configured"),
                &ctx,
            ));
        };

        let token = bearer_token(&parts.headers).ok_or_else(|| {
            map_domain_error(
                &DomainError::unauthenticated("missing bearer token"),
                &ctx,
            )
        })?;

        auth.authenticate(token)
            .map(AuthenticatedUser)
            .map_err(|e| map_domain_error(&e, &ctx))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer xyz")), Some("xyz"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
