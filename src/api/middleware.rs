//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The uniform error body returned by every handler
//! - Authentication (session token from `Authorization: Bearer` or the
//!   `session` cookie) and admin authorization
//! - Request statistics for the dashboard

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Request, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::Cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxAchievementRepository, SqlxEventRepository, SqlxGalleryRepository, SqlxMediaRepository,
    SqlxNewsCategoryRepository, SqlxNewsRepository, SqlxOfficialRepository,
    SqlxPotentialRepository, SqlxProfileRepository, SqlxSessionRepository,
    SqlxSettingsRepository, SqlxTourismCategoryRepository, SqlxTourismHouseRepository,
    SqlxTourismPackageRepository, SqlxUmkmRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole};
use crate::services::{
    AchievementService, AiAssistService, AssistError, DashboardService, EventService,
    GalleryService, ImageHost, LoginRateLimiter, MediaService, NewsService, OfficialService,
    PotentialService, ProfileService, ServiceError, SettingsService, Throttle, TourismService,
    UmkmService, UserService, UserServiceError,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lock-free request counters
pub struct RequestStats {
    total_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.total_response_time_us.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub config: Arc<Config>,
    pub cache: Arc<Cache>,
    pub user_service: Arc<UserService>,
    pub profile_service: Arc<ProfileService>,
    pub settings_service: Arc<SettingsService>,
    pub official_service: Arc<OfficialService>,
    pub news_service: Arc<NewsService>,
    pub event_service: Arc<EventService>,
    pub tourism_service: Arc<TourismService>,
    pub umkm_service: Arc<UmkmService>,
    pub gallery_service: Arc<GalleryService>,
    pub potential_service: Arc<PotentialService>,
    pub achievement_service: Arc<AchievementService>,
    pub media_service: Arc<MediaService>,
    pub ai_service: Arc<AiAssistService>,
    pub dashboard_service: Arc<DashboardService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire every repository and service over one pool, cache and image host.
    pub fn new(
        pool: DynDatabasePool,
        config: Config,
        cache: Arc<Cache>,
        image_host: Arc<dyn ImageHost>,
    ) -> anyhow::Result<Self> {
        let user_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.auth.session_days,
        );
        let media_service = Arc::new(MediaService::new(
            SqlxMediaRepository::boxed(pool.clone()),
            image_host,
            config.upload.clone(),
        ));
        let ai_service = AiAssistService::new(&config.ai)?;

        Ok(Self {
            user_service: Arc::new(user_service),
            profile_service: Arc::new(ProfileService::new(
                SqlxProfileRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            settings_service: Arc::new(SettingsService::new(
                SqlxSettingsRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            official_service: Arc::new(OfficialService::new(
                SqlxOfficialRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            news_service: Arc::new(NewsService::new(
                SqlxNewsRepository::boxed(pool.clone()),
                SqlxNewsCategoryRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            event_service: Arc::new(EventService::new(
                SqlxEventRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            tourism_service: Arc::new(TourismService::new(
                SqlxTourismCategoryRepository::boxed(pool.clone()),
                SqlxTourismPackageRepository::boxed(pool.clone()),
                SqlxTourismHouseRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            umkm_service: Arc::new(UmkmService::new(
                SqlxUmkmRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            gallery_service: Arc::new(GalleryService::new(
                SqlxGalleryRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            potential_service: Arc::new(PotentialService::new(
                SqlxPotentialRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            achievement_service: Arc::new(AchievementService::new(
                SqlxAchievementRepository::boxed(pool.clone()),
                media_service.clone(),
                cache.clone(),
            )),
            dashboard_service: Arc::new(DashboardService::new(pool.clone(), cache.clone())),
            ai_service: Arc::new(ai_service),
            media_service,
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            request_stats: Arc::new(RequestStats::new()),
            config: Arc::new(config),
            cache,
            pool,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error body: `{ "success": false, "error": { "code", "message" } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        let mut error = Self::new(code, message);
        error.error.details = Some(details);
        error
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// Log the cause and answer with a generic message
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Request failed");
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" | "AI_DISABLED" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" | "DUPLICATE" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Validation(msg) => Self::validation_error(msg),
            ServiceError::Duplicate(msg) => Self::new("DUPLICATE", msg),
            ServiceError::Conflict(msg) => Self::conflict(msg),
            ServiceError::Internal(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(msg) => Self::new("DUPLICATE", msg),
            e @ UserServiceError::NotFound(_) => Self::not_found(e.to_string()),
            UserServiceError::Conflict(msg) => Self::conflict(msg),
            UserServiceError::InternalError(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<AssistError> for ApiError {
    fn from(err: AssistError) -> Self {
        match err {
            AssistError::Disabled => Self::new("AI_DISABLED", err.to_string()),
            AssistError::EmptyInput | AssistError::InputTooLong { .. } => {
                Self::validation_error(err.to_string())
            }
            AssistError::Unavailable => Self::new("AI_UNAVAILABLE", err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

impl From<Throttle> for ApiError {
    fn from(throttle: Throttle) -> Self {
        let message = match throttle {
            Throttle::Ip { .. } => "Too many requests, please try again later",
            Throttle::Identifier { .. } => "Too many failed login attempts, please try again later",
        };
        Self::with_details(
            "RATE_LIMITED",
            message,
            serde_json::json!({ "retry_after": throttle.retry_after_secs() }),
        )
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Session token from the bearer header, falling back to the `session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix("session="))
        .map(str::to_string)
        .filter(|t| !t.is_empty())
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Must run inside [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.0.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Record request count and response time
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.request_stats.record(start.elapsed().as_micros() as u64);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc123")]);
        assert_eq!(extract_session_token(&map), Some("abc123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; session=tok-456")]);
        assert_eq!(extract_session_token(&map), Some("tok-456".to_string()));
    }

    #[test]
    fn test_bearer_takes_priority() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "session=from-cookie"),
        ]);
        assert_eq!(extract_session_token(&map), Some("from-header".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcg==")]);
        assert!(extract_session_token(&map).is_none());
        let map = headers(&[(header::COOKIE, "session=")]);
        assert!(extract_session_token(&map).is_none());
    }

    #[test]
    fn test_service_error_status_codes() {
        let cases = [
            (ServiceError::not_found("News", 3), StatusCode::NOT_FOUND),
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::Duplicate("slug taken".into()), StatusCode::CONFLICT),
            (ServiceError::Conflict("in use".into()), StatusCode::CONFLICT),
            (
                ServiceError::Internal(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let err = ApiError::from(ServiceError::Internal(anyhow::anyhow!("secret dsn")));
        assert_eq!(err.error.code, "INTERNAL_ERROR");
        assert!(!err.error.message.contains("secret"));
    }

    #[test]
    fn test_throttle_maps_to_429() {
        let err = ApiError::from(Throttle::Ip { retry_after_secs: 42 });
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error.details, Some(serde_json::json!({ "retry_after": 42 })));
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ApiError::forbidden("no")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn test_request_stats_average() {
        let stats = RequestStats::new();
        assert_eq!(stats.avg_response_time_us(), 0.0);
        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }

    async fn admin_gate_status(user: Option<User>) -> StatusCode {
        use axum::{body::Body, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/users", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn(require_admin));
        let mut request = Request::builder().uri("/users").body(Body::empty()).unwrap();
        if let Some(user) = user {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
        app.oneshot(request).await.unwrap().status()
    }

    fn user_with_role(role: UserRole) -> User {
        User {
            id: 1,
            name: "Perangkat".to_string(),
            email: "perangkat@banyuanyar.desa.id".to_string(),
            password_hash: String::new(),
            role,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_require_admin() {
        assert_eq!(admin_gate_status(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            admin_gate_status(Some(user_with_role(UserRole::Editor))).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            admin_gate_status(Some(user_with_role(UserRole::Admin))).await,
            StatusCode::OK
        );
    }
}
