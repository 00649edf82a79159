//! Upload and media endpoints
//!
//! - POST /api/v1/admin/upload - multipart `file`, optionally attached to an
//!   owner with `entity_type` + `entity_id` (+ `umkm_id` for products) and
//!   `caption`
//! - GET /api/v1/admin/media - list (entity_type, entity_id, page, per_page)
//! - PUT /api/v1/admin/media/order - reorder an owner's images
//! - PUT /api/v1/admin/media/{id} - edit caption
//! - DELETE /api/v1/admin/media/{id}

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, default_per_page, non_blank, PageResponse};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{EntityType, ListParams, Media, PagedResult};
use crate::services::UploadedFile;

/// Multipart overhead allowed on top of the file size limit
const FORM_OVERHEAD: usize = 64 * 1024;

/// Unattached upload (inline editor image)
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub storage_key: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct CaptionRequest {
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub ids: Vec<i64>,
}

pub fn router(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);

    Router::new()
        .route("/upload", post(upload).layer(DefaultBodyLimit::max(body_limit)))
        .route("/media", get(list_media))
        .route("/media/order", put(reorder_media))
        .route("/media/{id}", put(update_media).delete(delete_media))
}

/// Fields collected from the upload form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    entity_type: Option<String>,
    entity_id: Option<String>,
    umkm_id: Option<String>,
    caption: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
                form.file = Some(UploadedFile {
                    file_name,
                    mime_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let slot = match name.as_str() {
                "entity_type" => &mut form.entity_type,
                "entity_id" => &mut form.entity_id,
                "umkm_id" => &mut form.umkm_id,
                "caption" => &mut form.caption,
                _ => continue,
            };
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::validation_error(format!("Invalid field {}: {}", name, e)))?;
            *slot = non_blank(Some(text));
        }
        Ok(form)
    }
}

fn parse_id(field: &str, value: &str) -> Result<i64, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation_error(format!("{} must be a number", field)))
}

/// POST /api/v1/admin/upload
async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| ApiError::validation_error("No file provided"))?;

    match (form.entity_type, form.entity_id) {
        (Some(entity_type), Some(entity_id)) => {
            let entity_type: EntityType = entity_type
                .parse()
                .map_err(|e: crate::models::InvalidValue| ApiError::validation_error(e.to_string()))?;
            let entity_id = parse_id("entity_id", &entity_id)?;
            let umkm_id = form
                .umkm_id
                .as_deref()
                .map(|v| parse_id("umkm_id", v))
                .transpose()?;

            ensure_owner_exists(&state, entity_type, entity_id, umkm_id).await?;
            let media = state
                .media_service
                .attach(entity_type, entity_id, &file, form.caption)
                .await?;
            Ok((StatusCode::CREATED, Json(media)).into_response())
        }
        (None, None) => {
            let stored = state.media_service.upload(&file).await?;
            Ok((
                StatusCode::CREATED,
                Json(UploadResponse {
                    url: stored.url,
                    storage_key: stored.storage_key,
                    size: file.bytes.len(),
                    file_name: file.file_name,
                    mime_type: file.mime_type,
                }),
            )
                .into_response())
        }
        _ => Err(ApiError::validation_error(
            "entity_type and entity_id must be provided together",
        )),
    }
}

/// Reject uploads for owners that do not exist
async fn ensure_owner_exists(
    state: &AppState,
    entity_type: EntityType,
    entity_id: i64,
    umkm_id: Option<i64>,
) -> Result<(), ApiError> {
    match entity_type {
        EntityType::News => state.news_service.get(entity_id).await.map(drop)?,
        EntityType::Event => state.event_service.get(entity_id).await.map(drop)?,
        EntityType::TourismPackage => state.tourism_service.get_package(entity_id).await.map(drop)?,
        EntityType::TourismHouse => state.tourism_service.get_house(entity_id).await.map(drop)?,
        EntityType::Umkm => state.umkm_service.get(entity_id).await.map(drop)?,
        EntityType::UmkmProduct => {
            let umkm_id = umkm_id
                .ok_or_else(|| ApiError::validation_error("umkm_id is required for product images"))?;
            state.umkm_service.get_product(umkm_id, entity_id).await.map(drop)?
        }
        EntityType::Gallery => state.gallery_service.get(entity_id).await.map(drop)?,
        EntityType::Potential => state.potential_service.get(entity_id).await.map(drop)?,
        EntityType::Achievement => state.achievement_service.get(entity_id).await.map(drop)?,
        EntityType::Official => state.official_service.get(entity_id).await.map(drop)?,
    }
    Ok(())
}

/// GET /api/v1/admin/media
///
/// With both `entity_type` and `entity_id` the owner's images are returned
/// in display order on a single page.
async fn list_media(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MediaQuery>,
) -> Result<Json<PageResponse<Media>>, ApiError> {
    let entity_type = non_blank(query.entity_type)
        .map(|t| t.parse::<EntityType>())
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    match (entity_type, query.entity_id) {
        (Some(entity_type), Some(entity_id)) => {
            let items = state
                .media_service
                .list_for_entity(entity_type, entity_id)
                .await?;
            let total = items.len() as i64;
            let per_page = items.len() as u32;
            let single = PagedResult::<Media> {
                items: Vec::new(),
                total,
                page: 1,
                per_page,
            };
            Ok(Json(PageResponse::with_items(single, items)))
        }
        (None, Some(_)) => Err(ApiError::validation_error(
            "entity_type is required when filtering by entity_id",
        )),
        (entity_type, None) => {
            let page = state
                .media_service
                .list(entity_type, &ListParams::new(query.page, query.per_page))
                .await?;
            Ok(Json(page.into()))
        }
    }
}

/// PUT /api/v1/admin/media/{id}
async fn update_media(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CaptionRequest>,
) -> Result<Json<Media>, ApiError> {
    Ok(Json(state.media_service.update_caption(id, body.caption).await?))
}

/// PUT /api/v1/admin/media/order
///
/// `ids` must list every image of the owner exactly once.
async fn reorder_media(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<Media>>, ApiError> {
    let media = state
        .media_service
        .reorder(body.entity_type, body.entity_id, &body.ids)
        .await?;
    Ok(Json(media))
}

/// DELETE /api/v1/admin/media/{id}
async fn delete_media(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.media_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
