//! Public pages and back-office content management over HTTP

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::spawn_app;

#[tokio::test]
async fn test_site_serves_seeded_settings_and_profile() {
    let app = spawn_app().await;

    let response = app.server.get("/api/v1/site").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["settings"]["site_name"], "Desa Banyuanyar");
    assert_eq!(body["settings"]["news_per_page"], 9);
    assert_eq!(body["profile"]["umum"]["nama_desa"], "Banyuanyar");
}

#[tokio::test]
async fn test_settings_update_is_public() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let mut settings: Value = app
        .server
        .get("/api/v1/admin/settings")
        .authorization_bearer(&token)
        .await
        .json();
    settings["contact_phone"] = json!("0812-3456-7890");
    settings["news_per_page"] = json!(6);

    app.server
        .put("/api/v1/admin/settings")
        .authorization_bearer(&token)
        .json(&settings)
        .await
        .assert_status_ok();

    let site: Value = app.server.get("/api/v1/site").await.json();
    assert_eq!(site["settings"]["contact_phone"], "0812-3456-7890");
    assert_eq!(site["settings"]["news_per_page"], 6);
}

#[tokio::test]
async fn test_profile_bulk_update() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    app.server
        .put("/api/v1/admin/profile")
        .authorization_bearer(&token)
        .json(&json!([
            { "key": "visi", "section": "visi_misi", "value": "Desa mandiri dan lestari" },
            { "key": "nama_desa", "value": "" },
        ]))
        .await
        .assert_status_ok();

    let section: Value = app.server.get("/api/v1/profile/visi_misi").await.json();
    assert_eq!(section[0]["key"], "visi");
    assert_eq!(section[0]["value"], "Desa mandiri dan lestari");

    let grouped: Value = app.server.get("/api/v1/profile").await.json();
    assert!(grouped.get("umum").map_or(true, |umum| umum.get("nama_desa").is_none()));
}

#[tokio::test]
async fn test_news_publication_flow() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let category = app
        .create(&token, "/news-categories", json!({ "name": "Pengumuman" }))
        .await;
    assert_eq!(category["slug"], "pengumuman");

    let draft = app
        .create(
            &token,
            "/news",
            json!({
                "title": "Musyawarah Desa 2026",
                "content": "<p>Musyawarah digelar di balai desa.</p>",
                "category_id": category["id"],
            }),
        )
        .await;
    assert_eq!(draft["slug"], "musyawarah-desa-2026");
    assert_eq!(draft["status"], "draft");

    let public: Value = app.server.get("/api/v1/news").await.json();
    assert_eq!(public["total"], 0);
    app.server
        .get("/api/v1/news/musyawarah-desa-2026")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let id = draft["id"].as_i64().unwrap();
    app.server
        .put(&format!("/api/v1/admin/news/{}", id))
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Musyawarah Desa 2026",
            "content": "<p>Musyawarah digelar di balai desa.</p>",
            "category_id": category["id"],
            "status": "published",
        }))
        .await
        .assert_status_ok();

    let public: Value = app
        .server
        .get("/api/v1/news")
        .add_query_param("category", "pengumuman")
        .await
        .json();
    assert_eq!(public["total"], 1);
    assert_eq!(public["has_next"], false);
    assert_eq!(public["items"][0]["title"], "Musyawarah Desa 2026");

    let detail: Value = app.server.get("/api/v1/news/musyawarah-desa-2026").await.json();
    assert_eq!(detail["category"]["name"], "Pengumuman");
    assert_eq!(detail["view_count"], 1);

    let latest: Value = app.server.get("/api/v1/news/latest").await.json();
    assert_eq!(latest.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_news_duplicate_slug_conflicts() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let body = json!({ "title": "Kerja Bakti", "slug": "kerja-bakti", "content": "Minggu pagi" });
    app.create(&token, "/news", body.clone()).await;

    let response = app
        .server
        .post("/api/v1/admin/news")
        .authorization_bearer(&token)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_news_requires_title() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let response = app
        .server
        .post("/api/v1/admin/news")
        .authorization_bearer(&token)
        .json(&json!({ "title": "   ", "content": "Isi" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_record_has_error_body() {
    let app = spawn_app().await;

    let response = app.server.get("/api/v1/umkm/tidak-ada").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_tourism_category_in_use_cannot_be_deleted() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let category = app
        .create(&token, "/tourism/categories", json!({ "name": "Wisata Alam" }))
        .await;
    let package = app
        .create(
            &token,
            "/tourism/packages",
            json!({
                "category_id": category["id"],
                "name": "Susur Sungai",
                "description": "Menyusuri sungai dengan rakit bambu",
                "price": 75000,
            }),
        )
        .await;

    let category_path = format!("/api/v1/admin/tourism/categories/{}", category["id"]);
    app.server
        .delete(&category_path)
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::CONFLICT);

    let public: Value = app.server.get("/api/v1/tourism/packages").await.json();
    assert_eq!(public[0]["slug"], "susur-sungai");

    app.server
        .delete(&format!("/api/v1/admin/tourism/packages/{}", package["id"]))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete(&category_path)
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_umkm_page_lists_products() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let umkm = app
        .create(
            &token,
            "/umkm",
            json!({
                "name": "Keripik Singkong Bu Sri",
                "owner_name": "Sri Wahyuni",
                "category": "kuliner",
                "description": "Keripik singkong aneka rasa",
            }),
        )
        .await;
    let umkm_id = umkm["id"].as_i64().unwrap();
    app.create(
        &token,
        &format!("/umkm/{}/products", umkm_id),
        json!({ "name": "Keripik Balado 200g", "price": 15000 }),
    )
    .await;

    let page: Value = app
        .server
        .get(&format!("/api/v1/umkm/{}", umkm["slug"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(page["name"], "Keripik Singkong Bu Sri");
    assert_eq!(page["products"][0]["name"], "Keripik Balado 200g");
    assert_eq!(page["products"][0]["price"], 15000);
}

#[tokio::test]
async fn test_events_filter_rejects_unknown_phase() {
    let app = spawn_app().await;

    app.server
        .get("/api/v1/events")
        .add_query_param("phase", "upcoming")
        .await
        .assert_status_ok();
    app.server
        .get("/api/v1/events")
        .add_query_param("phase", "kemarin")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_input_keeps_error_shape() {
    let app = spawn_app().await;
    let token = app.setup_admin().await;

    let news = app
        .create(&token, "/news", json!({ "title": "Kerja Bakti", "content": "Minggu pagi" }))
        .await;

    let response = app
        .server
        .put(&format!("/api/v1/admin/news/{}", news["id"]))
        .authorization_bearer(&token)
        .json(&json!({ "content": "<p>Isi baru</p>" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let response = app
        .server
        .get("/api/v1/news")
        .add_query_param("page", "abc")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let response = app
        .server
        .get("/api/v1/admin/news/bukan-angka")
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
