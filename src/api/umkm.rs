//! UMKM endpoints
//!
//! Public:
//! - GET /api/v1/umkm?category=&page=&page_size=
//! - GET /api/v1/umkm/{slug} - Business with its available products
//!
//! Admin:
//! - /api/v1/admin/umkm - CRUD
//! - /api/v1/admin/umkm/{id}/products - Product CRUD scoped to one business

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{
    default_page, default_per_page, non_blank, paged_with_covers, with_covers, with_images,
    PageResponse, WithCover, WithImages,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    EntityType, ListParams, Media, Umkm, UmkmDetail, UmkmInput, UmkmProduct, UmkmProductInput,
};

fn default_public_page_size() -> u32 {
    12
}

#[derive(Debug, Deserialize)]
pub struct PublicUmkmQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_public_page_size")]
    pub page_size: u32,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminUmkmQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub category: Option<String>,
}

/// Business page: products carry their own cover image
#[derive(Debug, Serialize)]
pub struct UmkmPage {
    #[serde(flatten)]
    pub umkm: Umkm,
    pub products: Vec<WithCover<UmkmProduct>>,
    pub images: Vec<Media>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/umkm", get(list_public))
        .route("/umkm/{slug}", get(get_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/umkm", get(list_admin).post(create))
        .route("/umkm/{id}", get(get_one).put(update).delete(remove))
        .route("/umkm/{id}/products", get(list_products).post(create_product))
        .route(
            "/umkm/{id}/products/{product_id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PublicUmkmQuery>,
) -> Result<Json<PageResponse<WithCover<Umkm>>>, ApiError> {
    let category = non_blank(query.category);
    let page = state
        .umkm_service
        .list_public(category.as_deref(), ListParams::new(query.page, query.page_size))
        .await?;
    Ok(Json(paged_with_covers(&state.media_service, page).await?))
}

async fn get_public(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<UmkmPage>, ApiError> {
    let detail = state.umkm_service.get_public_detail(&slug).await?;
    Ok(Json(page(&state, detail).await?))
}

async fn list_admin(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminUmkmQuery>,
) -> Result<Json<PageResponse<Umkm>>, ApiError> {
    let category = non_blank(query.category);
    let page = state
        .umkm_service
        .list_admin(category.as_deref(), ListParams::new(query.page, query.per_page))
        .await?;
    Ok(Json(page.into()))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UmkmPage>, ApiError> {
    let detail = state.umkm_service.get_detail(id).await?;
    Ok(Json(page(&state, detail).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UmkmInput>,
) -> Result<(StatusCode, Json<Umkm>), ApiError> {
    let umkm = state.umkm_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(umkm)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UmkmInput>,
) -> Result<Json<Umkm>, ApiError> {
    Ok(Json(state.umkm_service.update(id, input).await?))
}

/// DELETE /api/v1/admin/umkm/{id}
///
/// Products and every attached image go with it.
async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.umkm_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Products
// ============================================================================

async fn list_products(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<UmkmProduct>>, ApiError> {
    Ok(Json(state.umkm_service.list_products(id).await?))
}

async fn get_product(
    State(state): State<AppState>,
    ApiPath((id, product_id)): ApiPath<(i64, i64)>,
) -> Result<Json<WithImages<UmkmProduct>>, ApiError> {
    let product = state.umkm_service.get_product(id, product_id).await?;
    Ok(Json(with_images(&state.media_service, product).await?))
}

async fn create_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UmkmProductInput>,
) -> Result<(StatusCode, Json<UmkmProduct>), ApiError> {
    let product = state.umkm_service.create_product(id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    ApiPath((id, product_id)): ApiPath<(i64, i64)>,
    ApiJson(input): ApiJson<UmkmProductInput>,
) -> Result<Json<UmkmProduct>, ApiError> {
    Ok(Json(state.umkm_service.update_product(id, product_id, input).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    ApiPath((id, product_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.umkm_service.delete_product(id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn page(state: &AppState, detail: UmkmDetail) -> Result<UmkmPage, ApiError> {
    let products = with_covers(&state.media_service, detail.products).await?;
    let images = state
        .media_service
        .list_for_entity(EntityType::Umkm, detail.umkm.id)
        .await?;
    Ok(UmkmPage {
        umkm: detail.umkm,
        products,
        images,
    })
}
