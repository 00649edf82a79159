//! Account management (admin role only)
//!
//! - GET|POST /api/v1/admin/users
//! - GET|PUT|DELETE /api/v1/admin/users/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateUserInput, UpdateUserInput, User};
use crate::services::UserServiceError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", get(get_one).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.list_users().await?))
}

async fn get_one(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<User>, ApiError> {
    let user = state
        .user_service
        .get_by_id(id)
        .await?
        .ok_or(UserServiceError::NotFound(id))?;
    Ok(Json(user))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.user_service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/v1/admin/users/{id}
///
/// Only the provided fields change. The last admin cannot be demoted.
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.update_user(id, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    AuthenticatedUser(acting): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_user(id, acting.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
