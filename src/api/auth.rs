use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar},
    WithRejection,
};
use serde::Deserialize;

use crate::api::middleware::{session_token, CurrentUser, SESSION_COOKIE, SESSION_HEADER};
use crate::api::state::AppState;
use crate::api::ApiResponse;
use crate::error::AppError;
use crate::registry::UserSummary;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, AppError>,
) -> Result<Json<ApiResponse<UserSummary>>, AppError> {
    let user = state
        .registry
        .write()
        .await
        .register(&req.username, &req.password)?;

    tracing::info!(user_id = user.id, "👤 Registered {}", user.username);

    Ok(ApiResponse::with_message(user, "registered"))
}

/// POST /api/login
///
/// Binds a new session: the token is set as the `session` cookie and echoed
/// in the `X-Session-Token` header for clients that send it as a bearer token.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .registry
        .read()
        .await
        .authenticate(&req.username, &req.password)
        .inspect_err(|_| tracing::warn!("failed login for {:?}", req.username.trim()))?;

    let session = state
        .sessions
        .lock()
        .await
        .create(user.id, state.config.session_expiry_hours);

    tracing::info!(user_id = user.id, "🔑 Logged in {}", user.username);

    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true);

    Ok((
        jar.add(cookie),
        [(SESSION_HEADER, session.token)],
        ApiResponse::with_message(user, "logged in"),
    ))
}

/// POST /api/logout
///
/// Always succeeds; an unknown or missing session is simply ignored.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.lock().await.delete(&token);
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        ApiResponse::message_only("logged out"),
    )
}

/// GET /api/current_user (requires auth)
pub async fn current_user(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<UserSummary>>, AppError> {
    let user = state.registry.read().await.current_user(Some(user_id))?;

    Ok(ApiResponse::ok(user))
}
