//! Gallery endpoints
//!
//! - GET /api/v1/galleries, GET /api/v1/galleries/{slug}
//! - /api/v1/admin/galleries - CRUD

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, paged_with_covers, PageResponse, PaginationQuery, WithCover};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Gallery, GalleryDetail, GalleryInput, ListParams};

fn default_page_size() -> u32 {
    12
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/galleries", get(list_public))
        .route("/galleries/{slug}", get(get_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/galleries", get(list_admin).post(create))
        .route("/galleries/{id}", get(get_one).put(update).delete(remove))
}

async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GalleryQuery>,
) -> Result<Json<PageResponse<WithCover<Gallery>>>, ApiError> {
    let page = state
        .gallery_service
        .list(ListParams::new(query.page, query.page_size))
        .await?;
    Ok(Json(paged_with_covers(&state.media_service, page).await?))
}

async fn get_public(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<GalleryDetail>, ApiError> {
    Ok(Json(state.gallery_service.get_detail_by_slug(&slug).await?))
}

async fn list_admin(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PaginationQuery>,
) -> Result<Json<PageResponse<WithCover<Gallery>>>, ApiError> {
    let page = state.gallery_service.list(query.params()).await?;
    Ok(Json(paged_with_covers(&state.media_service, page).await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<GalleryDetail>, ApiError> {
    Ok(Json(state.gallery_service.get_detail(id).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<(StatusCode, Json<Gallery>), ApiError> {
    let gallery = state.gallery_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(gallery)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<Json<Gallery>, ApiError> {
    Ok(Json(state.gallery_service.update(id, input).await?))
}

async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.gallery_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
