//! News API endpoints
//!
//! Public:
//! - GET /api/v1/news - Published news (page, page_size, category, q)
//! - GET /api/v1/news/latest - Newest published articles
//! - GET /api/v1/news/{slug} - Article detail, counts a view
//! - GET /api/v1/news-categories - All categories
//!
//! Admin:
//! - /api/v1/admin/news - CRUD with status filter
//! - /api/v1/admin/news-categories - CRUD

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{
    default_page, default_per_page, non_blank, paged_with_covers, with_covers, PageResponse,
    WithCover,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    EntityType, ListParams, Media, News, NewsCategory, NewsCategoryInput, NewsFilter, NewsInput,
    NewsStatus,
};
use crate::services::ServiceError;

const DEFAULT_LATEST: u32 = 3;
const MAX_LATEST: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct PublicNewsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    /// Falls back to the `news_per_page` site setting
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AdminNewsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Article with its category and images
#[derive(Debug, Serialize)]
pub struct NewsDetail {
    #[serde(flatten)]
    pub news: News,
    pub category: Option<NewsCategory>,
    pub images: Vec<Media>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_public))
        .route("/news/latest", get(latest))
        .route("/news/{slug}", get(get_public))
        .route("/news-categories", get(list_categories))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_admin).post(create))
        .route("/news/{id}", get(get_admin).put(update).delete(remove))
        .route("/news-categories", get(list_categories).post(create_category))
        .route(
            "/news-categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

// ============================================================================
// Public
// ============================================================================

/// GET /api/v1/news
async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PublicNewsQuery>,
) -> Result<Json<PageResponse<WithCover<News>>>, ApiError> {
    let page_size = match query.page_size {
        Some(size) => size,
        None => state.settings_service.get_site_settings().await?.news_per_page,
    };
    let category = non_blank(query.category);
    let search = non_blank(query.q);

    let page = state
        .news_service
        .list_public(
            category.as_deref(),
            search.as_deref(),
            ListParams::new(query.page, page_size),
        )
        .await?;
    Ok(Json(paged_with_covers(&state.media_service, page).await?))
}

/// GET /api/v1/news/latest
async fn latest(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LatestQuery>,
) -> Result<Json<Vec<WithCover<News>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LATEST).clamp(1, MAX_LATEST);
    let news = state.news_service.latest(limit).await?;
    Ok(Json(with_covers(&state.media_service, news).await?))
}

/// GET /api/v1/news/{slug}
async fn get_public(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<NewsDetail>, ApiError> {
    let news = state.news_service.get_public_by_slug(&slug).await?;
    Ok(Json(detail(&state, news).await?))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsCategory>>, ApiError> {
    Ok(Json(state.news_service.list_categories().await?))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/v1/admin/news
async fn list_admin(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminNewsQuery>,
) -> Result<Json<PageResponse<News>>, ApiError> {
    let status = non_blank(query.status)
        .map(|s| s.parse::<NewsStatus>())
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;
    let filter = NewsFilter {
        status,
        category: non_blank(query.category),
        search: non_blank(query.q),
    };

    let page = state
        .news_service
        .list_admin(&filter, ListParams::new(query.page, query.per_page))
        .await?;
    Ok(Json(page.into()))
}

async fn get_admin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<NewsDetail>, ApiError> {
    let news = state.news_service.get(id).await?;
    Ok(Json(detail(&state, news).await?))
}

/// POST /api/v1/admin/news
async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<NewsInput>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    let news = state.news_service.create(input, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(news)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<NewsInput>,
) -> Result<Json<News>, ApiError> {
    Ok(Json(state.news_service.update(id, input).await?))
}

async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.news_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<NewsCategory>, ApiError> {
    Ok(Json(state.news_service.get_category(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewsCategoryInput>,
) -> Result<(StatusCode, Json<NewsCategory>), ApiError> {
    let category = state.news_service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<NewsCategoryInput>,
) -> Result<Json<NewsCategory>, ApiError> {
    Ok(Json(state.news_service.update_category(id, input).await?))
}

/// DELETE /api/v1/admin/news-categories/{id}
///
/// Articles of the category become uncategorized.
async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.news_service.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn detail(state: &AppState, news: News) -> Result<NewsDetail, ApiError> {
    let category = match news.category_id {
        Some(category_id) => match state.news_service.get_category(category_id).await {
            Ok(category) => Some(category),
            Err(ServiceError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    let images = state
        .media_service
        .list_for_entity(EntityType::News, news.id)
        .await?;
    Ok(NewsDetail {
        news,
        category,
        images,
    })
}
