//! Tourism category and package repositories

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{
    PackageFilter, TourismCategory, TourismCategoryInput, TourismPackage, TourismPackageInput,
};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";
const PACKAGE_COLUMNS: &str = "id, category_id, name, slug, description, price, duration, \
                               facilities, is_active, created_at, updated_at";

// ============================================================================
// Categories
// ============================================================================

#[async_trait]
pub trait TourismCategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<TourismCategory>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<TourismCategory>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<TourismCategory>>;

    async fn create(&self, input: &TourismCategoryInput, slug: &str) -> Result<TourismCategory>;

    async fn update(
        &self,
        id: i64,
        input: &TourismCategoryInput,
        slug: &str,
    ) -> Result<Option<TourismCategory>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of packages referencing the category
    async fn package_count(&self, id: i64) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxTourismCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxTourismCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TourismCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TourismCategoryRepository for SqlxTourismCategoryRepository {
    async fn list(&self) -> Result<Vec<TourismCategory>> {
        let sql = format!("SELECT {} FROM tourism_categories ORDER BY name", CATEGORY_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismCategory>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list tourism categories")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<TourismCategory>> {
        let sql = format!("SELECT {} FROM tourism_categories WHERE id = ?", CATEGORY_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismCategory>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get tourism category")
        })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<TourismCategory>> {
        let sql = format!(
            "SELECT {} FROM tourism_categories WHERE LOWER(name) = LOWER(?)",
            CATEGORY_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismCategory>(&sql)
                .bind(name)
                .fetch_optional(db)
                .await
                .context("Failed to get tourism category by name")
        })
    }

    async fn create(&self, input: &TourismCategoryInput, slug: &str) -> Result<TourismCategory> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                "INSERT INTO tourism_categories (name, slug, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create tourism category")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("Tourism category missing after insert")
    }

    async fn update(
        &self,
        id: i64,
        input: &TourismCategoryInput,
        slug: &str,
    ) -> Result<Option<TourismCategory>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                "UPDATE tourism_categories SET name = ?, slug = ?, description = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update tourism category")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM tourism_categories WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete tourism category")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn package_count(&self, id: i64) -> Result<i64> {
        on_pool!(self.pool, |db| {
            let row = sqlx::query("SELECT COUNT(*) AS count FROM tourism_packages WHERE category_id = ?")
                .bind(id)
                .fetch_one(db)
                .await
                .context("Failed to count tourism packages")?;
            Ok(row.get::<i64, _>("count"))
        })
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "tourism_categories", slug, exclude_id).await
    }
}

// ============================================================================
// Packages
// ============================================================================

#[async_trait]
pub trait TourismPackageRepository: Send + Sync {
    /// Packages ordered by name
    async fn list(&self, filter: &PackageFilter) -> Result<Vec<TourismPackage>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<TourismPackage>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<TourismPackage>>;

    async fn create(&self, input: &TourismPackageInput, slug: &str) -> Result<TourismPackage>;

    async fn update(
        &self,
        id: i64,
        input: &TourismPackageInput,
        slug: &str,
    ) -> Result<Option<TourismPackage>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxTourismPackageRepository {
    pool: DynDatabasePool,
}

impl SqlxTourismPackageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TourismPackageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TourismPackageRepository for SqlxTourismPackageRepository {
    async fn list(&self, filter: &PackageFilter) -> Result<Vec<TourismPackage>> {
        let mut conditions = Vec::new();
        if filter.active_only {
            conditions.push("is_active = 1");
        }
        let category = filter.category.as_deref().filter(|c| !c.is_empty());
        if category.is_some() {
            conditions.push("category_id IN (SELECT id FROM tourism_categories WHERE slug = ?)");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM tourism_packages {} ORDER BY name, id",
            PACKAGE_COLUMNS, where_clause
        );

        on_pool!(self.pool, |db| {
            let mut query = sqlx::query_as::<_, TourismPackage>(&sql);
            if let Some(slug) = category {
                query = query.bind(slug);
            }
            query
                .fetch_all(db)
                .await
                .context("Failed to list tourism packages")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<TourismPackage>> {
        let sql = format!("SELECT {} FROM tourism_packages WHERE id = ?", PACKAGE_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismPackage>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get tourism package")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<TourismPackage>> {
        let sql = format!("SELECT {} FROM tourism_packages WHERE slug = ?", PACKAGE_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismPackage>(&sql)
                .bind(slug)
                .fetch_optional(db)
                .await
                .context("Failed to get tourism package by slug")
        })
    }

    async fn create(&self, input: &TourismPackageInput, slug: &str) -> Result<TourismPackage> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO tourism_packages (category_id, name, slug, description, price, duration,
                                              facilities, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(input.category_id)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.duration)
            .bind(&input.facilities)
            .bind(input.is_active)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create tourism package")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("Tourism package missing after insert")
    }

    async fn update(
        &self,
        id: i64,
        input: &TourismPackageInput,
        slug: &str,
    ) -> Result<Option<TourismPackage>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE tourism_packages
                SET category_id = ?, name = ?, slug = ?, description = ?, price = ?, duration = ?,
                    facilities = ?, is_active = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(input.category_id)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.duration)
            .bind(&input.facilities)
            .bind(input.is_active)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update tourism package")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM tourism_packages WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete tourism package")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "tourism_packages").await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "tourism_packages", slug, exclude_id).await
    }
}
