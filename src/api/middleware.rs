use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use std::convert::Infallible;

use crate::api::state::AppState;
use crate::error::AppError;
use crate::registry::UserId;

/// Cookie set by `POST /api/login`.
pub const SESSION_COOKIE: &str = "session";

/// Header carrying the session token in the login response.
pub const SESSION_HEADER: &str = "x-session-token";

/// Session token from the `session` cookie, or from `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Identity bound to the request's session, if any.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<UserId>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        let sessions = state.sessions.lock().await;
        Ok(MaybeUser(
            sessions.get_by_token(&token).map(|session| session.user_id),
        ))
    }
}

/// Identity required - rejects with 401 before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user_id) = match MaybeUser::from_request_parts(parts, state).await {
            Ok(user) => user,
            Err(never) => match never {},
        };

        user_id.map(CurrentUser).ok_or_else(|| {
            tracing::warn!("rejected unauthenticated request to {}", parts.uri.path());
            AppError::Auth("please log in first".to_string())
        })
    }
}
