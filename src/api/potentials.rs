//! Village potential and achievement endpoints
//!
//! - GET /api/v1/potentials?category=, GET /api/v1/achievements
//! - /api/v1/admin/potentials, /api/v1/admin/achievements - CRUD

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
use crate::models::{Achievement, AchievementInput, PotentialInput, VillagePotential};

#[derive(Debug, Deserialize)]
pub struct PotentialQuery {
    pub category: Option<String>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/potentials", get(list_potentials))
        .route("/achievements", get(list_achievements))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/potentials", get(list_potentials).post(create_potential))
        .route(
            "/potentials/{id}",
            get(get_potential).put(update_potential).delete(delete_potential),
        )
        .route("/achievements", get(list_achievements).post(create_achievement))
        .route(
            "/achievements/{id}",
            get(get_achievement).put(update_achievement).delete(delete_achievement),
        )
}

async fn list_potentials(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PotentialQuery>,
) -> Result<Json<Vec<WithCover<VillagePotential>>>, ApiError> {
    let category = non_blank(query.category);
    let potentials = state.potential_service.list(category.as_deref()).await?;
    Ok(Json(with_covers(&state.media_service, potentials).await?))
}

async fn get_potential(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<WithImages<VillagePotential>>, ApiError> {
    let potential = state.potential_service.get(id).await?;
    Ok(Json(with_images(&state.media_service, potential).await?))
}

async fn create_potential(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PotentialInput>,
) -> Result<(StatusCode, Json<VillagePotential>), ApiError> {
    let potential = state.potential_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(potential)))
}

async fn update_potential(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<PotentialInput>,
) -> Result<Json<VillagePotential>, ApiError> {
    Ok(Json(state.potential_service.update(id, input).await?))
}

async fn delete_potential(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.potential_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_achievements(
    State(state): State<AppState>,
) -> Result<Json<Vec<WithCover<Achievement>>>, ApiError> {
    let achievements = state.achievement_service.list().await?;
    Ok(Json(with_covers(&state.media_service, achievements).await?))
}

async fn get_achievement(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<WithImages<Achievement>>, ApiError> {
    let achievement = state.achievement_service.get(id).await?;
    Ok(Json(with_images(&state.media_service, achievement).await?))
}

async fn create_achievement(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AchievementInput>,
) -> Result<(StatusCode, Json<Achievement>), ApiError> {
    let achievement = state.achievement_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

async fn update_achievement(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<AchievementInput>,
) -> Result<Json<Achievement>, ApiError> {
    Ok(Json(state.achievement_service.update(id, input).await?))
}

async fn delete_achievement(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.achievement_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
