//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api/v1`:
//! - Public read endpoints for the landing pages
//! - `/auth` for setup, login and the session owner
//! - `/admin` for the back-office (any signed-in account; `/admin/users`
//!   needs the admin role)
//!
//! Locally stored uploads are served from `/uploads`.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod common;
pub mod events;
pub mod extract;
pub mod galleries;
pub mod middleware;
pub mod news;
pub mod officials;
pub mod potentials;
pub mod site;
pub mod tourism;
pub mod umkm;
pub mod upload;
pub mod users;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::config::UploadDriver;

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let users_routes = users::router().route_layer(axum_middleware::from_fn(middleware::require_admin));

    let admin_routes = Router::new()
        .merge(admin::router())
        .merge(site::admin_router())
        .merge(officials::admin_router())
        .merge(news::admin_router())
        .merge(events::admin_router())
        .merge(tourism::admin_router())
        .merge(umkm::admin_router())
        .merge(galleries::admin_router())
        .merge(potentials::admin_router())
        .merge(upload::router(state.config.upload.max_file_size))
        .merge(ai::router())
        .merge(users_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let protected_auth_routes = auth::protected_router().route_layer(
        axum_middleware::from_fn_with_state(state, middleware::require_auth),
    );

    Router::new()
        .merge(site::public_router())
        .merge(officials::public_router())
        .merge(news::public_router())
        .merge(events::public_router())
        .merge(tourism::public_router())
        .merge(umkm::public_router())
        .merge(galleries::public_router())
        .merge(potentials::public_router())
        .nest("/auth", auth::public_router().merge(protected_auth_routes))
        .nest("/admin", admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origin = HeaderValue::from_str(&state.config.server.cors_origin)
        .context("Invalid server.cors_origin")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let mut router = Router::new().nest("/api/v1", build_api_router(state.clone()));
    if state.config.upload.driver == UploadDriver::Local {
        router = router.nest_service("/uploads", ServeDir::new(&state.config.upload.path));
    }

    Ok(router
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state))
}
