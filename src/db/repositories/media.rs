//! Media repository
//!
//! Database operations for images attached to content entities.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::{on_pool, placeholders, DynDatabasePool, LastInsertId};
use crate::models::{EntityType, ListParams, Media, NewMedia, PagedResult};

const MEDIA_COLUMNS: &str = "id, entity_type, entity_id, url, storage_key, file_name, mime_type, \
                             size, caption, sort_order, created_at";

#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Insert at the end of the owner's images
    async fn create(&self, media: &NewMedia) -> Result<Media>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Media>>;

    /// Images of one entity in display order
    async fn list_for_entity(&self, entity_type: EntityType, entity_id: i64) -> Result<Vec<Media>>;

    /// Images of several entities of one type, grouped by entity then display order
    async fn list_for_entities(&self, entity_type: EntityType, entity_ids: &[i64]) -> Result<Vec<Media>>;

    /// Paged listing for the media library, newest first
    async fn list(&self, entity_type: Option<EntityType>, params: &ListParams) -> Result<PagedResult<Media>>;

    async fn update_caption(&self, id: i64, caption: Option<&str>) -> Result<bool>;

    async fn set_sort_order(&self, id: i64, sort_order: i32) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Delete every row of one entity
    async fn delete_for_entity(&self, entity_type: EntityType, entity_id: i64) -> Result<u64>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxMediaRepository {
    pool: DynDatabasePool,
}

impl SqlxMediaRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MediaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepository {
    async fn create(&self, media: &NewMedia) -> Result<Media> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let next: i64 = sqlx::query(
                "SELECT COALESCE(MAX(sort_order) + 1, 0) AS next FROM media WHERE entity_type = ? AND entity_id = ?",
            )
            .bind(media.entity_type.as_str())
            .bind(media.entity_id)
            .fetch_one(db)
            .await
            .context("Failed to compute media position")?
            .get("next");

            let result = sqlx::query(
                r#"
                INSERT INTO media (entity_type, entity_id, url, storage_key, file_name, mime_type,
                                   size, caption, sort_order, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(media.entity_type.as_str())
            .bind(media.entity_id)
            .bind(&media.url)
            .bind(&media.storage_key)
            .bind(&media.file_name)
            .bind(&media.mime_type)
            .bind(media.size)
            .bind(&media.caption)
            .bind(next as i32)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create media")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id).await?.context("Media missing after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Media>> {
        let sql = format!("SELECT {} FROM media WHERE id = ?", MEDIA_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Media>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get media")
        })
    }

    async fn list_for_entity(&self, entity_type: EntityType, entity_id: i64) -> Result<Vec<Media>> {
        self.list_for_entities(entity_type, &[entity_id]).await
    }

    async fn list_for_entities(&self, entity_type: EntityType, entity_ids: &[i64]) -> Result<Vec<Media>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM media WHERE entity_type = ? AND entity_id IN ({}) ORDER BY entity_id, sort_order, id",
            MEDIA_COLUMNS,
            placeholders(entity_ids.len())
        );
        on_pool!(self.pool, |db| {
            let mut query = sqlx::query_as::<_, Media>(&sql).bind(entity_type.as_str());
            for id in entity_ids {
                query = query.bind(*id);
            }
            query
                .fetch_all(db)
                .await
                .context("Failed to list media for entities")
        })
    }

    async fn list(&self, entity_type: Option<EntityType>, params: &ListParams) -> Result<PagedResult<Media>> {
        let where_clause = if entity_type.is_some() { "WHERE entity_type = ?" } else { "" };
        let count_sql = format!("SELECT COUNT(*) AS count FROM media {}", where_clause);
        let list_sql = format!(
            "SELECT {} FROM media {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            MEDIA_COLUMNS, where_clause
        );
        let type_str = entity_type.map(|t| t.as_str());

        on_pool!(self.pool, |db| {
            let mut count_query = sqlx::query(&count_sql);
            if let Some(t) = type_str {
                count_query = count_query.bind(t);
            }
            let total: i64 = count_query
                .fetch_one(db)
                .await
                .context("Failed to count media")?
                .get("count");

            let mut list_query = sqlx::query_as::<_, Media>(&list_sql);
            if let Some(t) = type_str {
                list_query = list_query.bind(t);
            }
            let items = list_query
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(db)
                .await
                .context("Failed to list media")?;

            Ok(PagedResult::new(items, total, params))
        })
    }

    async fn update_caption(&self, id: i64, caption: Option<&str>) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        on_pool!(self.pool, |db| {
            sqlx::query("UPDATE media SET caption = ? WHERE id = ?")
                .bind(caption)
                .bind(id)
                .execute(db)
                .await
                .context("Failed to update media caption")?;
            Ok(true)
        })
    }

    async fn set_sort_order(&self, id: i64, sort_order: i32) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("UPDATE media SET sort_order = ? WHERE id = ?")
                .bind(sort_order)
                .bind(id)
                .execute(db)
                .await
                .context("Failed to reorder media")?;
            Ok(())
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM media WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete media")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn delete_for_entity(&self, entity_type: EntityType, entity_id: i64) -> Result<u64> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM media WHERE entity_type = ? AND entity_id = ?")
                .bind(entity_type.as_str())
                .bind(entity_id)
                .execute(db)
                .await
                .context("Failed to delete entity media")?;
            Ok(result.rows_affected())
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "media").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn new_media(entity_type: EntityType, entity_id: i64, name: &str) -> NewMedia {
        NewMedia {
            entity_type,
            entity_id,
            url: format!("/uploads/{}", name),
            storage_key: name.to_string(),
            file_name: name.to_string(),
            mime_type: "image/jpeg".to_string(),
            size: 2048,
            caption: None,
        }
    }

    #[tokio::test]
    async fn test_create_appends_positions() {
        let repo = SqlxMediaRepository::new(migrated_pool().await);
        let first = repo.create(&new_media(EntityType::Gallery, 1, "a.jpg")).await.unwrap();
        let second = repo.create(&new_media(EntityType::Gallery, 1, "b.jpg")).await.unwrap();
        let other = repo.create(&new_media(EntityType::News, 1, "c.jpg")).await.unwrap();

        assert_eq!(first.sort_order, 0);
        assert_eq!(second.sort_order, 1);
        assert_eq!(other.sort_order, 0);
        assert_eq!(first.entity_type, EntityType::Gallery);
    }

    #[tokio::test]
    async fn test_list_for_entities_and_reorder() {
        let repo = SqlxMediaRepository::new(migrated_pool().await);
        let a = repo.create(&new_media(EntityType::Umkm, 1, "a.jpg")).await.unwrap();
        let b = repo.create(&new_media(EntityType::Umkm, 1, "b.jpg")).await.unwrap();
        repo.create(&new_media(EntityType::Umkm, 2, "c.jpg")).await.unwrap();
        repo.create(&new_media(EntityType::Umkm, 3, "d.jpg")).await.unwrap();

        repo.set_sort_order(a.id, 1).await.unwrap();
        repo.set_sort_order(b.id, 0).await.unwrap();

        let own = repo.list_for_entity(EntityType::Umkm, 1).await.unwrap();
        assert_eq!(own[0].id, b.id);

        let many = repo.list_for_entities(EntityType::Umkm, &[1, 2]).await.unwrap();
        assert_eq!(many.len(), 3);
        assert!(repo.list_for_entities(EntityType::Umkm, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caption_delete_and_library_listing() {
        let repo = SqlxMediaRepository::new(migrated_pool().await);
        let media = repo.create(&new_media(EntityType::Event, 7, "e.jpg")).await.unwrap();
        repo.create(&new_media(EntityType::Event, 7, "f.jpg")).await.unwrap();
        repo.create(&new_media(EntityType::News, 1, "g.jpg")).await.unwrap();

        assert!(repo.update_caption(media.id, Some("Pembukaan")).await.unwrap());
        assert!(!repo.update_caption(999, Some("x")).await.unwrap());
        assert_eq!(
            repo.get_by_id(media.id).await.unwrap().unwrap().caption.as_deref(),
            Some("Pembukaan")
        );

        let events = repo.list(Some(EntityType::Event), &ListParams::default()).await.unwrap();
        assert_eq!(events.total, 2);
        let all = repo.list(None, &ListParams::default()).await.unwrap();
        assert_eq!(all.total, 3);

        assert_eq!(repo.delete_for_entity(EntityType::Event, 7).await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
