//! Event (agenda) endpoints
//!
//! - GET /api/v1/events?phase=upcoming|ongoing|finished
//! - GET /api/v1/events/{slug}
//! - /api/v1/admin/events - CRUD

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{non_blank, with_covers, with_images, WithCover, WithImages};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Event, EventInput, EventPhase};

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub phase: Option<String>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_public))
        .route("/events/{slug}", get(get_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_all).post(create))
        .route("/events/{id}", get(get_one).put(update).delete(remove))
}

/// GET /api/v1/events
async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> Result<Json<Vec<WithCover<Event>>>, ApiError> {
    let phase = non_blank(query.phase)
        .map(|p| p.parse::<EventPhase>())
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let events = state.event_service.list_public(phase).await?;
    Ok(Json(with_covers(&state.media_service, events).await?))
}

async fn get_public(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<WithImages<Event>>, ApiError> {
    let event = state.event_service.get_public_by_slug(&slug).await?;
    Ok(Json(with_images(&state.media_service, event).await?))
}

async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.event_service.list_all().await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<WithImages<Event>>, ApiError> {
    let event = state.event_service.get(id).await?;
    Ok(Json(with_images(&state.media_service, event).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.event_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.event_service.update(id, input).await?))
}

async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.event_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
