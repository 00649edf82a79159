//! News repository
//!
//! Database operations for news articles.
//!
//! This module provides:
//! - `NewsRepository` trait defining the interface for news data access
//! - `SqlxNewsRepository` implementing the trait for SQLite and MySQL
//!
//! Listing supports paging plus filters on status, category slug and a
//! free-text term matched against title and excerpt.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{ListParams, News, NewsFilter, NewsStatus, PagedResult};

const NEWS_COLUMNS: &str = "id, category_id, author_id, title, slug, content, excerpt, status, \
                            published_at, view_count, created_at, updated_at";

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Insert a news article, ignoring `id` and timestamps of the argument
    async fn create(&self, news: &News) -> Result<News>;

    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<News>>;

    /// Persist every editable field of `news`
    async fn update(&self, news: &News) -> Result<News>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Paged listing, newest first
    async fn list(&self, filter: &NewsFilter, params: &ListParams) -> Result<PagedResult<News>>;

    async fn increment_view(&self, id: i64) -> Result<()>;

    async fn count_by_status(&self, status: NewsStatus) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Build the WHERE clause for a filter together with its bind values.
fn filter_clause(filter: &NewsFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = filter.status {
        conditions.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        conditions.push("category_id IN (SELECT id FROM news_categories WHERE slug = ?)");
        binds.push(category.to_string());
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        conditions.push("(LOWER(title) LIKE ? OR LOWER(excerpt) LIKE ?)");
        let pattern = format!("%{}%", term.to_lowercase());
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), binds)
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, news: &News) -> Result<News> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO news (category_id, author_id, title, slug, content, excerpt, status,
                                  published_at, view_count, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
                "#,
            )
            .bind(news.category_id)
            .bind(news.author_id)
            .bind(&news.title)
            .bind(&news.slug)
            .bind(&news.content)
            .bind(&news.excerpt)
            .bind(news.status.as_str())
            .bind(news.published_at)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create news")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id).await?.context("News missing after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        let sql = format!("SELECT {} FROM news WHERE id = ?", NEWS_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, News>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get news by ID")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<News>> {
        let sql = format!("SELECT {} FROM news WHERE slug = ?", NEWS_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, News>(&sql)
                .bind(slug)
                .fetch_optional(db)
                .await
                .context("Failed to get news by slug")
        })
    }

    async fn update(&self, news: &News) -> Result<News> {
        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE news
                SET category_id = ?, title = ?, slug = ?, content = ?, excerpt = ?, status = ?,
                    published_at = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(news.category_id)
            .bind(&news.title)
            .bind(&news.slug)
            .bind(&news.content)
            .bind(&news.excerpt)
            .bind(news.status.as_str())
            .bind(news.published_at)
            .bind(now)
            .bind(news.id)
            .execute(db)
            .await
            .context("Failed to update news")?;
            Ok::<_, anyhow::Error>(())
        })?;

        Ok(News {
            updated_at: now,
            ..news.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM news WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete news")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn list(&self, filter: &NewsFilter, params: &ListParams) -> Result<PagedResult<News>> {
        let (where_clause, binds) = filter_clause(filter);
        let count_sql = format!("SELECT COUNT(*) AS count FROM news {}", where_clause);
        let list_sql = format!(
            "SELECT {} FROM news {} ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
            NEWS_COLUMNS, where_clause
        );

        on_pool!(self.pool, |db| {
            let mut count_query = sqlx::query(&count_sql);
            for value in &binds {
                count_query = count_query.bind(value);
            }
            let total: i64 = count_query
                .fetch_one(db)
                .await
                .context("Failed to count news")?
                .get("count");

            let mut list_query = sqlx::query_as::<_, News>(&list_sql);
            for value in &binds {
                list_query = list_query.bind(value);
            }
            let items = list_query
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(db)
                .await
                .context("Failed to list news")?;

            Ok(PagedResult::new(items, total, params))
        })
    }

    async fn increment_view(&self, id: i64) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("UPDATE news SET view_count = view_count + 1 WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to increment news view count")?;
            Ok(())
        })
    }

    async fn count_by_status(&self, status: NewsStatus) -> Result<i64> {
        on_pool!(self.pool, |db| {
            let row = sqlx::query("SELECT COUNT(*) AS count FROM news WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(db)
                .await
                .context("Failed to count news by status")?;
            Ok(row.get::<i64, _>("count"))
        })
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "news", slug, exclude_id).await
    }
}
