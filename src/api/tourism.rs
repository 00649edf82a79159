//! Tourism endpoints
//!
//! Public:
//! - GET /api/v1/tourism/categories
//! - GET /api/v1/tourism/packages?category=, GET /api/v1/tourism/packages/{slug}
//! - GET /api/v1/tourism/houses, GET /api/v1/tourism/houses/{slug}
//!
//! Admin: CRUD under /api/v1/admin/tourism/{categories,packages,houses}

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
use crate::models::{
    PackageFilter, TourismCategory, TourismCategoryInput, TourismHouse, TourismHouseInput,
    TourismPackage, TourismPackageInput,
};

#[derive(Debug, Deserialize)]
pub struct PackageQuery {
    pub category: Option<String>,
    /// Admin only: restrict to active packages
    #[serde(default)]
    pub active: bool,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/tourism/categories", get(list_categories))
        .route("/tourism/packages", get(list_public_packages))
        .route("/tourism/packages/{slug}", get(get_public_package))
        .route("/tourism/houses", get(list_public_houses))
        .route("/tourism/houses/{slug}", get(get_public_house))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/tourism/categories", get(list_categories).post(create_category))
        .route(
            "/tourism/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/tourism/packages", get(list_packages).post(create_package))
        .route(
            "/tourism/packages/{id}",
            get(get_package).put(update_package).delete(delete_package),
        )
        .route("/tourism/houses", get(list_houses).post(create_house))
        .route(
            "/tourism/houses/{id}",
            get(get_house).put(update_house).delete(delete_house),
        )
}

// ============================================================================
// Categories
// ============================================================================

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<TourismCategory>>, ApiError> {
    Ok(Json(state.tourism_service.list_categories().await?))
}

async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<TourismCategory>, ApiError> {
    Ok(Json(state.tourism_service.get_category(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TourismCategoryInput>,
) -> Result<(StatusCode, Json<TourismCategory>), ApiError> {
    let category = state.tourism_service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TourismCategoryInput>,
) -> Result<Json<TourismCategory>, ApiError> {
    Ok(Json(state.tourism_service.update_category(id, input).await?))
}

/// DELETE /api/v1/admin/tourism/categories/{id}
///
/// 409 while packages still use the category.
async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.tourism_service.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Packages
// ============================================================================

async fn list_public_packages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PackageQuery>,
) -> Result<Json<Vec<WithCover<TourismPackage>>>, ApiError> {
    let category = non_blank(query.category);
    let packages = state
        .tourism_service
        .list_public_packages(category.as_deref())
        .await?;
    Ok(Json(with_covers(&state.media_service, packages).await?))
}

async fn get_public_package(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<WithImages<TourismPackage>>, ApiError> {
    let package = state.tourism_service.get_public_package(&slug).await?;
    Ok(Json(with_images(&state.media_service, package).await?))
}

async fn list_packages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PackageQuery>,
) -> Result<Json<Vec<TourismPackage>>, ApiError> {
    let filter = PackageFilter {
        category: non_blank(query.category),
        active_only: query.active,
    };
    Ok(Json(state.tourism_service.list_packages(&filter).await?))
}

async fn get_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<WithImages<TourismPackage>>, ApiError> {
    let package = state.tourism_service.get_package(id).await?;
    Ok(Json(with_images(&state.media_service, package).await?))
}

async fn create_package(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TourismPackageInput>,
) -> Result<(StatusCode, Json<TourismPackage>), ApiError> {
    let package = state.tourism_service.create_package(input).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

async fn update_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TourismPackageInput>,
) -> Result<Json<TourismPackage>, ApiError> {
    Ok(Json(state.tourism_service.update_package(id, input).await?))
}

async fn delete_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.tourism_service.delete_package(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Houses
// ============================================================================

async fn list_public_houses(
    State(state): State<AppState>,
) -> Result<Json<Vec<WithCover<TourismHouse>>>, ApiError> {
    let houses = state.tourism_service.list_public_houses().await?;
    Ok(Json(with_covers(&state.media_service, houses).await?))
}

async fn get_public_house(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<WithImages<TourismHouse>>, ApiError> {
    let house = state.tourism_service.get_public_house(&slug).await?;
    Ok(Json(with_images(&state.media_service, house).await?))
}

async fn list_houses(State(state): State<AppState>) -> Result<Json<Vec<TourismHouse>>, ApiError> {
    Ok(Json(state.tourism_service.list_houses().await?))
}

async fn get_house(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<WithImages<TourismHouse>>, ApiError> {
    let house = state.tourism_service.get_house(id).await?;
    Ok(Json(with_images(&state.media_service, house).await?))
}

async fn create_house(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TourismHouseInput>,
) -> Result<(StatusCode, Json<TourismHouse>), ApiError> {
    let house = state.tourism_service.create_house(input).await?;
    Ok((StatusCode::CREATED, Json(house)))
}

async fn update_house(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TourismHouseInput>,
) -> Result<Json<TourismHouse>, ApiError> {
    Ok(Json(state.tourism_service.update_house(id, input).await?))
}

async fn delete_house(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.tourism_service.delete_house(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
