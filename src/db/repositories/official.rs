//! Government official repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{GovernmentOfficial, OfficialInput};

const OFFICIAL_COLUMNS: &str =
    "id, name, position, photo, period, sort_order, is_active, created_at, updated_at";

#[async_trait]
pub trait OfficialRepository: Send + Sync {
    /// List officials by `sort_order`, optionally only active ones
    async fn list(&self, active_only: bool) -> Result<Vec<GovernmentOfficial>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<GovernmentOfficial>>;

    async fn create(&self, input: &OfficialInput) -> Result<GovernmentOfficial>;

    /// Returns `None` if the official does not exist
    async fn update(&self, id: i64, input: &OfficialInput) -> Result<Option<GovernmentOfficial>>;

    /// Returns whether a row was deleted
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxOfficialRepository {
    pool: DynDatabasePool,
}

impl SqlxOfficialRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn OfficialRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl OfficialRepository for SqlxOfficialRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<GovernmentOfficial>> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        let sql = format!(
            "SELECT {} FROM government_officials {} ORDER BY sort_order, id",
            OFFICIAL_COLUMNS, filter
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, GovernmentOfficial>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list officials")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GovernmentOfficial>> {
        let sql = format!("SELECT {} FROM government_officials WHERE id = ?", OFFICIAL_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, GovernmentOfficial>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get official")
        })
    }

    async fn create(&self, input: &OfficialInput) -> Result<GovernmentOfficial> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO government_officials
                    (name, position, photo, period, sort_order, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.name)
            .bind(&input.position)
            .bind(&input.photo)
            .bind(&input.period)
            .bind(input.sort_order)
            .bind(input.is_active)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create official")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("Official missing after insert")
    }

    async fn update(&self, id: i64, input: &OfficialInput) -> Result<Option<GovernmentOfficial>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE government_officials
                SET name = ?, position = ?, photo = ?, period = ?, sort_order = ?, is_active = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&input.name)
            .bind(&input.position)
            .bind(&input.photo)
            .bind(&input.period)
            .bind(input.sort_order)
            .bind(input.is_active)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update official")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM government_officials WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete official")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "government_officials").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn input(name: &str, position: &str, sort_order: i32, is_active: bool) -> OfficialInput {
        OfficialInput {
            name: name.to_string(),
            position: position.to_string(),
            photo: None,
            period: Some("2019-2025".to_string()),
            sort_order,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_list_ordered_and_active_filter() {
        let repo = SqlxOfficialRepository::new(migrated_pool().await);
        repo.create(&input("Sri", "Sekretaris Desa", 2, true)).await.unwrap();
        repo.create(&input("Joko", "Kepala Desa", 1, true)).await.unwrap();
        repo.create(&input("Darmo", "Kaur Umum", 3, false)).await.unwrap();

        let all = repo.list(false).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].position, "Kepala Desa");

        let active = repo.list(true).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|o| o.is_active));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = SqlxOfficialRepository::new(migrated_pool().await);
        let created = repo.create(&input("Joko", "Kepala Desa", 1, true)).await.unwrap();

        let updated = repo
            .update(created.id, &input("Joko Susilo", "Kepala Desa", 1, true))
            .await
            .unwrap()
            .expect("exists");
        assert_eq!(updated.name, "Joko Susilo");

        assert!(repo.update(999, &input("X", "Y", 0, true)).await.unwrap().is_none());
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
