//! News category repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{NewsCategory, NewsCategoryInput};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

#[async_trait]
pub trait NewsCategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<NewsCategory>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsCategory>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsCategory>>;

    /// Case-insensitive lookup by name
    async fn get_by_name(&self, name: &str) -> Result<Option<NewsCategory>>;

    /// Insert with an already resolved `slug`
    async fn create(&self, input: &NewsCategoryInput, slug: &str) -> Result<NewsCategory>;

    async fn update(&self, id: i64, input: &NewsCategoryInput, slug: &str) -> Result<Option<NewsCategory>>;

    /// Delete the category; news in it keep existing without a category
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxNewsCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsCategoryRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<NewsCategory>> {
        let sql = format!("SELECT {} FROM news_categories WHERE {}", CATEGORY_COLUMNS, clause);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, NewsCategory>(&sql)
                .bind(value)
                .fetch_optional(db)
                .await
                .context("Failed to get news category")
        })
    }
}

#[async_trait]
impl NewsCategoryRepository for SqlxNewsCategoryRepository {
    async fn list(&self) -> Result<Vec<NewsCategory>> {
        let sql = format!("SELECT {} FROM news_categories ORDER BY name", CATEGORY_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, NewsCategory>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list news categories")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsCategory>> {
        let sql = format!("SELECT {} FROM news_categories WHERE id = ?", CATEGORY_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, NewsCategory>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get news category")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsCategory>> {
        self.fetch_one_where("slug = ?", slug).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<NewsCategory>> {
        self.fetch_one_where("LOWER(name) = LOWER(?)", name).await
    }

    async fn create(&self, input: &NewsCategoryInput, slug: &str) -> Result<NewsCategory> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                "INSERT INTO news_categories (name, slug, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create news category")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("News category missing after insert")
    }

    async fn update(&self, id: i64, input: &NewsCategoryInput, slug: &str) -> Result<Option<NewsCategory>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                "UPDATE news_categories SET name = ?, slug = ?, description = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update news category")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            // Detach explicitly, MyISAM tables ignore ON DELETE SET NULL
            sqlx::query("UPDATE news SET category_id = NULL WHERE category_id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to detach news from category")?;
            let result = sqlx::query("DELETE FROM news_categories WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete news category")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "news_categories", slug, exclude_id).await
    }
}
