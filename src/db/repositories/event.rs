//! Event repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{Event, EventInput};

const EVENT_COLUMNS: &str =
    "id, title, slug, description, location, start_at, end_at, is_published, created_at, updated_at";

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events by start time (ascending)
    async fn list(&self, published_only: bool) -> Result<Vec<Event>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    async fn create(&self, input: &EventInput, slug: &str) -> Result<Event>;

    async fn update(&self, id: i64, input: &EventInput, slug: &str) -> Result<Option<Event>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxEventRepository {
    pool: DynDatabasePool,
}

impl SqlxEventRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn list(&self, published_only: bool) -> Result<Vec<Event>> {
        let filter = if published_only { "WHERE is_published = 1" } else { "" };
        let sql = format!(
            "SELECT {} FROM events {} ORDER BY start_at, id",
            EVENT_COLUMNS, filter
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Event>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list events")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Event>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get event")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE slug = ?", EVENT_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Event>(&sql)
                .bind(slug)
                .fetch_optional(db)
                .await
                .context("Failed to get event by slug")
        })
    }

    async fn create(&self, input: &EventInput, slug: &str) -> Result<Event> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO events (title, slug, description, location, start_at, end_at,
                                    is_published, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.is_published)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create event")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id).await?.context("Event missing after insert")
    }

    async fn update(&self, id: i64, input: &EventInput, slug: &str) -> Result<Option<Event>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE events
                SET title = ?, slug = ?, description = ?, location = ?, start_at = ?, end_at = ?,
                    is_published = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.is_published)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update event")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM events WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete event")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "events").await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "events", slug, exclude_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use chrono::{Duration, TimeZone};

    fn input(title: &str, start_day: u32, is_published: bool) -> EventInput {
        let start = Utc.with_ymd_and_hms(2024, 8, start_day, 8, 0, 0).unwrap();
        EventInput {
            title: title.to_string(),
            slug: None,
            description: "Agenda desa".to_string(),
            location: Some("Lapangan".to_string()),
            start_at: start,
            end_at: Some(start + Duration::hours(4)),
            is_published,
        }
    }

    #[tokio::test]
    async fn test_list_sorted_and_published_filter() {
        let repo = SqlxEventRepository::new(migrated_pool().await);
        repo.create(&input("Lomba", 17, true), "lomba").await.unwrap();
        repo.create(&input("Kirab", 10, true), "kirab").await.unwrap();
        repo.create(&input("Rapat", 5, false), "rapat").await.unwrap();

        let all = repo.list(false).await.unwrap();
        let slugs: Vec<&str> = all.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["rapat", "kirab", "lomba"]);

        assert_eq!(repo.list(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_roundtrip_dates() {
        let repo = SqlxEventRepository::new(migrated_pool().await);
        let data = input("Sedekah Bumi", 20, true);
        let created = repo.create(&data, "sedekah-bumi").await.unwrap();

        assert_eq!(created.start_at, data.start_at);
        assert_eq!(created.end_at, data.end_at);

        let mut changed = data.clone();
        changed.end_at = None;
        let updated = repo.update(created.id, &changed, "sedekah-bumi").await.unwrap().unwrap();
        assert!(updated.end_at.is_none());
        assert!(repo.update(404, &changed, "x").await.unwrap().is_none());
    }
}
