use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{CurrentUser, MaybeUser};
use crate::api::state::AppState;
use crate::api::ApiResponse;
use crate::error::AppError;
use crate::registry::{
    Category, EventDetail, EventFilter, EventId, EventRegistry, EventStatus, EventView,
    InterestState, MyEvents, NewEvent, Stats,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: [Category; 4],
}

/// GET /api/events?category=..&status=upcoming|past|all
pub async fn list_events(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    WithRejection(Query(query), _): WithRejection<Query<ListEventsQuery>, AppError>,
) -> Result<Json<ApiResponse<EventListResponse>>, AppError> {
    let filter = EventFilter {
        category: query.category,
        status: query
            .status
            .as_deref()
            .map(EventStatus::parse)
            .unwrap_or_default(),
    };

    let events = state.registry.read().await.list_events(&filter, caller);
    let total = events.len();

    Ok(ApiResponse::ok(EventListResponse { events, total }))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    WithRejection(Path(event_id), _): WithRejection<Path<EventId>, AppError>,
) -> Result<Json<ApiResponse<EventDetail>>, AppError> {
    let detail = state.registry.read().await.get_event(event_id, caller)?;

    Ok(ApiResponse::ok(detail))
}

/// POST /api/events (requires auth)
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(fields), _): WithRejection<Json<NewEvent>, AppError>,
) -> Result<Json<ApiResponse<EventView>>, AppError> {
    let event = state
        .registry
        .write()
        .await
        .create_event(Some(user_id), fields)?;

    Ok(ApiResponse::with_message(event, "event created"))
}

/// POST /api/events/:id/interest (requires auth)
pub async fn toggle_interest(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(event_id), _): WithRejection<Path<EventId>, AppError>,
) -> Result<Json<ApiResponse<InterestState>>, AppError> {
    // Held across the capacity check and the append
    let result = state
        .registry
        .write()
        .await
        .toggle_interest(Some(user_id), event_id)?;

    let message = if result.is_interested {
        "marked as interested"
    } else {
        "interest cancelled"
    };

    Ok(ApiResponse::with_message(result, message))
}

/// GET /api/my/events (requires auth)
pub async fn my_events(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<MyEvents>>, AppError> {
    let mine = state.registry.read().await.my_events(Some(user_id))?;

    Ok(ApiResponse::ok(mine))
}

/// GET /api/categories
pub async fn categories() -> Json<ApiResponse<CategoriesResponse>> {
    ApiResponse::ok(CategoriesResponse {
        categories: EventRegistry::categories(),
    })
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<Stats>> {
    ApiResponse::ok(state.registry.read().await.stats())
}
