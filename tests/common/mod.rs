//! Shared setup for the HTTP integration tests

#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use banyuanyar::api::{build_router, AppState};
use banyuanyar::cache::create_cache;
use banyuanyar::config::Config;
use banyuanyar::db::{create_test_pool, migrations::run_migrations};
use banyuanyar::services::LocalImageHost;

pub const ADMIN_EMAIL: &str = "admin@banyuanyar.desa.id";
pub const ADMIN_PASSWORD: &str = "rahasia-desa-123";

pub struct TestApp {
    pub server: TestServer,
    pub uploads: TempDir,
}

/// Router over a migrated in-memory database with uploads in a temp dir
pub async fn spawn_app() -> TestApp {
    let uploads = TempDir::new().unwrap();
    let mut config = Config::default();
    config.upload.path = uploads.path().to_path_buf();

    let pool = create_test_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let cache = create_cache(&config.cache).unwrap();
    let host = Arc::new(LocalImageHost::new(
        uploads.path().to_path_buf(),
        &config.upload.public_base,
    ));

    let state = AppState::new(pool, config, cache, host).unwrap();
    let server = TestServer::new(build_router(state).unwrap()).unwrap();
    TestApp { server, uploads }
}

impl TestApp {
    /// Run first-time setup and return the admin's session token
    pub async fn setup_admin(&self) -> String {
        let response = self
            .server
            .post("/api/v1/auth/setup")
            .json(&json!({
                "name": "Perangkat Desa",
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        token_of(&response.json())
    }

    /// Create an editor account through the admin API and log in as it
    pub async fn editor_token(&self, admin_token: &str) -> String {
        self.server
            .post("/api/v1/admin/users")
            .authorization_bearer(admin_token)
            .json(&json!({
                "name": "Editor Berita",
                "email": "editor@banyuanyar.desa.id",
                "password": "editor-desa-123",
                "role": "editor",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = self
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "editor@banyuanyar.desa.id", "password": "editor-desa-123" }))
            .await;
        response.assert_status_ok();
        token_of(&response.json())
    }

    /// POST a JSON body to an admin route and return the created record
    pub async fn create(&self, token: &str, path: &str, body: Value) -> Value {
        let response = self
            .server
            .post(&format!("/api/v1/admin{}", path))
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

pub fn token_of(body: &Value) -> String {
    body["token"].as_str().unwrap().to_string()
}

/// A tiny valid PNG
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}
