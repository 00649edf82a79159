//! Gallery repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{Gallery, GalleryInput, ListParams, PagedResult};

const GALLERY_COLUMNS: &str = "id, title, slug, description, taken_at, created_at, updated_at";

#[async_trait]
pub trait GalleryRepository: Send + Sync {
    /// Paged listing, most recent first
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Gallery>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Gallery>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Gallery>>;

    async fn create(&self, input: &GalleryInput, slug: &str) -> Result<Gallery>;

    async fn update(&self, id: i64, input: &GalleryInput, slug: &str) -> Result<Option<Gallery>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxGalleryRepository {
    pool: DynDatabasePool,
}

impl SqlxGalleryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GalleryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GalleryRepository for SqlxGalleryRepository {
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Gallery>> {
        let sql = format!(
            "SELECT {} FROM galleries ORDER BY COALESCE(taken_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
            GALLERY_COLUMNS
        );
        on_pool!(self.pool, |db| {
            let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM galleries")
                .fetch_one(db)
                .await
                .context("Failed to count galleries")?
                .get("count");
            let items = sqlx::query_as::<_, Gallery>(&sql)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(db)
                .await
                .context("Failed to list galleries")?;
            Ok(PagedResult::new(items, total, params))
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Gallery>> {
        let sql = format!("SELECT {} FROM galleries WHERE id = ?", GALLERY_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Gallery>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get gallery")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Gallery>> {
        let sql = format!("SELECT {} FROM galleries WHERE slug = ?", GALLERY_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Gallery>(&sql)
                .bind(slug)
                .fetch_optional(db)
                .await
                .context("Failed to get gallery by slug")
        })
    }

    async fn create(&self, input: &GalleryInput, slug: &str) -> Result<Gallery> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                "INSERT INTO galleries (title, slug, description, taken_at, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(input.taken_at)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create gallery")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id).await?.context("Gallery missing after insert")
    }

    async fn update(&self, id: i64, input: &GalleryInput, slug: &str) -> Result<Option<Gallery>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                "UPDATE galleries SET title = ?, slug = ?, description = ?, taken_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(input.taken_at)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update gallery")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM galleries WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete gallery")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "galleries").await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "galleries", slug, exclude_id).await
    }
}
