pub mod auth;
pub mod events;
pub mod state;
pub mod middleware;

pub use state::AppState;
pub use middleware::{CurrentUser, MaybeUser};

use axum::{
    http::StatusCode,
    Json,
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    timeout::TimeoutLayer,
};
use std::time::Duration;
use serde::Serialize;

/// Success half of the response envelope: {code: 0, message, data}
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Self::with_message(data, "success")
    }

    pub fn with_message(data: T, message: &str) -> Json<Self> {
        Json(Self {
            code: 0,
            message: message.to_string(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    /// Envelope with `data: null`.
    pub fn message_only(message: &str) -> Json<Self> {
        Json(Self {
            code: 0,
            message: message.to_string(),
            data: None,
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

const ENDPOINTS: [(&str, &str); 11] = [
    ("POST /api/register", "register a user"),
    ("POST /api/login", "log in"),
    ("POST /api/logout", "log out"),
    ("GET /api/current_user", "current user"),
    ("GET /api/events", "list events"),
    ("GET /api/events/<id>", "event detail"),
    ("POST /api/events", "create an event"),
    ("POST /api/events/<id>/interest", "toggle interest"),
    ("GET /api/my/events", "my events"),
    ("GET /api/categories", "list categories"),
    ("GET /api/stats", "statistics"),
];

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Service info
        .route("/", get(index))
        .route("/api/health", get(health))

        // Account endpoints
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/current_user", get(auth::current_user))

        // Event endpoints
        .route("/api/events", get(events::list_events).post(events::create_event))
        .route("/api/events/:id", get(events::get_event))
        .route("/api/events/:id/interest", post(events::toggle_interest))
        .route("/api/my/events", get(events::my_events))
        .route("/api/categories", get(events::categories))
        .route("/api/stats", get(events::stats))

        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    let endpoints: serde_json::Map<String, serde_json::Value> = ENDPOINTS
        .iter()
        .map(|(route, summary)| (route.to_string(), serde_json::Value::from(*summary)))
        .collect();

    Json(serde_json::json!({
        "name": "Campus Events API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
