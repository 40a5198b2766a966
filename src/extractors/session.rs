//! Resolve the acting user from `Authorization: Bearer <session id>`.

use crate::error::AppError;
use crate::model::SessionUser;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde::Deserialize;
use uuid::Uuid;

/// Authenticated owner of the request. Rejects with 401 when the token is
/// missing, malformed, unknown or expired, and with 403 when a `username`
/// query parameter names somebody else.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub SessionUser);

/// Optional token presented to login so it can be replaced.
#[derive(Clone, Debug)]
pub struct PriorSession(pub Option<Uuid>);

#[derive(Deserialize)]
struct OwnerQuery {
    username: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;
        let session = match state.store.resolve_session(token).await? {
            Some(s) => s,
            None => {
                tracing::warn!("unknown or expired session presented");
                return Err(AppError::Unauthorized("Invalid or expired session".into()));
            }
        };
        if let Some(claimed) = claimed_username(parts) {
            if claimed != session.username {
                tracing::warn!(user_id = session.user_id, "username parameter does not match session");
                return Err(AppError::Forbidden(
                    "username does not match the authenticated session".into(),
                ));
            }
        }
        Ok(CurrentUser(session))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PriorSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PriorSession(bearer_token(&parts.headers).ok().flatten()))
    }
}

/// `Ok(None)` when no Authorization header is present.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<Uuid>, AppError> {
    let Some(raw) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let malformed = || AppError::Unauthorized("Malformed bearer token".into());
    let value = raw.to_str().map_err(|_| malformed())?.trim();
    let (scheme, token) = value.split_once(' ').ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed());
    }
    Uuid::parse_str(token.trim()).map(Some).map_err(|_| malformed())
}

fn claimed_username(parts: &Parts) -> Option<String> {
    Query::<OwnerQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.username)
        .filter(|u| !u.is_empty())
}
