//! Site API endpoints
//!
//! Public:
//! - GET /api/v1/site - Site settings plus the village profile
//! - GET /api/v1/profile - Profile entries grouped by section
//! - GET /api/v1/profile/{section} - Entries of one section
//!
//! Admin:
//! - GET|PUT /api/v1/admin/profile, GET /api/v1/admin/profile/{key}
//! - GET|PUT /api/v1/admin/settings

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ProfileEntry, VillageProfile};
use crate::services::SiteSettings;

type GroupedProfile = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub settings: SiteSettings,
    pub profile: GroupedProfile,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/site", get(get_site))
        .route("/profile", get(get_profile))
        .route("/profile/{section}", get(get_profile_section))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(list_profile_entries).put(update_profile))
        .route("/profile/{key}", get(get_profile_entry))
        .route("/settings", get(get_settings).put(update_settings))
}

/// GET /api/v1/site
async fn get_site(State(state): State<AppState>) -> Result<Json<SiteResponse>, ApiError> {
    let settings = state.settings_service.get_site_settings().await?;
    let profile = state.profile_service.get_grouped().await?;
    Ok(Json(SiteResponse { settings, profile }))
}

/// GET /api/v1/profile
async fn get_profile(State(state): State<AppState>) -> Result<Json<GroupedProfile>, ApiError> {
    Ok(Json(state.profile_service.get_grouped().await?))
}

/// GET /api/v1/profile/{section}
async fn get_profile_section(
    State(state): State<AppState>,
    ApiPath(section): ApiPath<String>,
) -> Result<Json<Vec<VillageProfile>>, ApiError> {
    Ok(Json(state.profile_service.get_section(&section).await?))
}

/// GET /api/v1/admin/profile
async fn list_profile_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<VillageProfile>>, ApiError> {
    Ok(Json(state.profile_service.get_all().await?))
}

/// GET /api/v1/admin/profile/{key}
async fn get_profile_entry(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<VillageProfile>, ApiError> {
    Ok(Json(state.profile_service.get(&key).await?))
}

/// PUT /api/v1/admin/profile
///
/// Upserts every entry; an empty value removes the key. Returns the full profile.
async fn update_profile(
    State(state): State<AppState>,
    ApiJson(entries): ApiJson<Vec<ProfileEntry>>,
) -> Result<Json<Vec<VillageProfile>>, ApiError> {
    Ok(Json(state.profile_service.upsert_many(entries).await?))
}

/// GET /api/v1/admin/settings
async fn get_settings(State(state): State<AppState>) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(state.settings_service.get_site_settings().await?))
}

/// PUT /api/v1/admin/settings
async fn update_settings(
    State(state): State<AppState>,
    ApiJson(settings): ApiJson<SiteSettings>,
) -> Result<Json<SiteSettings>, ApiError> {
    let updated = state.settings_service.update_site_settings(&settings).await?;
    tracing::info!("Site settings updated");
    Ok(Json(updated))
}
