//! Government official endpoints
//!
//! - GET /api/v1/officials - Active officials in display order
//! - /api/v1/admin/officials - CRUD

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{GovernmentOfficial, OfficialInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/officials", get(list_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/officials", get(list_all).post(create))
        .route("/officials/{id}", get(get_one).put(update).delete(remove))
}

async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<GovernmentOfficial>>, ApiError> {
    Ok(Json(state.official_service.list_public().await?))
}

async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<GovernmentOfficial>>, ApiError> {
    Ok(Json(state.official_service.list_all().await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<GovernmentOfficial>, ApiError> {
    Ok(Json(state.official_service.get(id).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OfficialInput>,
) -> Result<(StatusCode, Json<GovernmentOfficial>), ApiError> {
    let official = state.official_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(official)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<OfficialInput>,
) -> Result<Json<GovernmentOfficial>, ApiError> {
    Ok(Json(state.official_service.update(id, input).await?))
}

async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.official_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
