//! Authentication API endpoints
//!
//! - GET /api/v1/auth/has-admin - Whether the first-run setup is done
//! - POST /api/v1/auth/setup - Create the first admin account
//! - POST /api/v1/auth/login - Log in (rate limited)
//! - POST /api/v1/auth/logout - Close the current session
//! - GET /api/v1/auth/me - Current user
//! - PUT /api/v1/auth/password - Change password

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::api::extract::ApiJson;
use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser};
use crate::models::{Session, User};
use crate::services::{LoginInput, SetupInput, UserServiceError};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct HasAdminResponse {
    pub has_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Routes that work without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/has-admin", get(has_admin))
        .route("/setup", post(setup))
        .route("/login", post(login))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", put(change_password))
}

/// GET /api/v1/auth/has-admin
async fn has_admin(State(state): State<AppState>) -> Result<Json<HasAdminResponse>, ApiError> {
    let has_admin = state.user_service.has_users().await?;
    Ok(Json(HasAdminResponse { has_admin }))
}

/// POST /api/v1/auth/setup
///
/// Only allowed while the users table is empty. Logs the new admin in.
async fn setup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SetupInput>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = LoginInput::new(body.email.clone(), body.password.clone());
    state.user_service.setup_first_admin(body).await?;
    let (session, user) = state.user_service.login(credentials).await?;

    Ok((
        StatusCode::CREATED,
        session_cookie(&state, &session)?,
        Json(auth_response(session, user)),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    if let Err(throttle) = state.rate_limiter.check(ip, &body.email).await {
        tracing::warn!(email = %body.email, ip = ?ip, "Login throttled");
        return Err(throttle.into());
    }

    let email = body.email.clone();
    match state.user_service.login(body).await {
        Ok((session, user)) => {
            state.rate_limiter.record_success(&email).await;
            Ok((session_cookie(&state, &session)?, Json(auth_response(session, user))))
        }
        Err(e @ UserServiceError::AuthenticationError(_)) => {
            state.rate_limiter.record_failure(&email).await;
            tracing::info!(email = %email, ip = ?ip, "Failed login attempt");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );
    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me
async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

/// PUT /api/v1/auth/password
///
/// Every other session is closed; the response carries the replacement token.
async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .user_service
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;

    Ok((session_cookie(&state, &session)?, Json(auth_response(session, user))))
}

fn auth_response(session: Session, user: User) -> AuthResponse {
    AuthResponse {
        user,
        expires_at: session.expires_at.to_rfc3339(),
        token: session.id,
    }
}

fn session_cookie(state: &AppState, session: &Session) -> Result<HeaderMap, ApiError> {
    let max_age = state.user_service.session_expiration_days() * 24 * 60 * 60;
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, max_age
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(ApiError::internal_error)?,
    );
    Ok(headers)
}

/// Client address as reported by the reverse proxy
fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    forwarded
        .or(real_ip)
        .and_then(|ip| ip.trim().parse().ok())
}
