//! Editor AI assist
//!
//! - GET /api/v1/admin/ai/actions - Supported actions and whether assist is enabled
//! - POST /api/v1/admin/ai/assist - Rewrite a fragment of editor text

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::Serialize;

use crate::api::extract::ApiJson;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::{AssistAction, AssistRequest, AssistResponse};

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub enabled: bool,
    pub actions: Vec<AssistAction>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/actions", get(actions))
        .route("/ai/assist", post(assist))
}

async fn actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        enabled: state.ai_service.is_enabled(),
        actions: AssistAction::ALL.to_vec(),
    })
}

/// POST /api/v1/admin/ai/assist
async fn assist(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(request): ApiJson<AssistRequest>,
) -> Result<Json<AssistResponse>, ApiError> {
    let response = state.ai_service.assist(&request).await?;
    tracing::debug!(user_id = user.id, action = ?request.action, provider = %response.provider, "AI assist answered");
    Ok(Json(response))
}
