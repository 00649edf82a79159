//! Banyuanyar CMS server

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banyuanyar::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
    services::create_image_host,
};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banyuanyar=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Banyuanyar CMS...");

    let config_path =
        std::env::var("BANYUANYAR_CONFIG").unwrap_or_else(|_| "config.yml".to_string());
    let config = Config::load_with_env(Path::new(&config_path))?;
    tracing::info!(path = %config_path, "Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    pool.ping().await?;
    tracing::info!(driver = ?config.database.driver, "Database connected");

    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database migrations completed");

    let cache = create_cache(&config.cache)?;
    tracing::info!(ttl_seconds = config.cache.ttl_seconds, "Cache initialized");

    let image_host = create_image_host(&config.upload, &config.image_host)?;
    tracing::info!(driver = ?config.upload.driver, "Image host initialized");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let bootstrap = config.auth.bootstrap_admin.clone();
    let state = AppState::new(pool.clone(), config, cache, image_host)?;

    if let Some(admin) = bootstrap {
        if let Some(user) = state.user_service.bootstrap_admin(&admin).await? {
            tracing::info!(email = %user.email, "Bootstrap admin created");
        }
    }
    if !state.ai_service.is_enabled() {
        tracing::info!("AI assist disabled");
    }

    spawn_housekeeping(&state);

    let app = api::build_router(state)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Periodic expired-session cleanup and rate limiter pruning
fn spawn_housekeeping(state: &AppState) {
    let users = state.user_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match users.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let tracked = limiter.cleanup().await;
            tracing::debug!(tracked, "Rate limiter pruned");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
