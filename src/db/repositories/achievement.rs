//! Achievement repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{Achievement, AchievementInput};

const ACHIEVEMENT_COLUMNS: &str = "id, title, description, year, level, created_at, updated_at";

#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Most recent year first
    async fn list(&self) -> Result<Vec<Achievement>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Achievement>>;

    async fn create(&self, input: &AchievementInput) -> Result<Achievement>;

    async fn update(&self, id: i64, input: &AchievementInput) -> Result<Option<Achievement>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxAchievementRepository {
    pool: DynDatabasePool,
}

impl SqlxAchievementRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AchievementRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AchievementRepository for SqlxAchievementRepository {
    async fn list(&self) -> Result<Vec<Achievement>> {
        let sql = format!(
            "SELECT {} FROM achievements ORDER BY year DESC, title",
            ACHIEVEMENT_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Achievement>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list achievements")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Achievement>> {
        let sql = format!("SELECT {} FROM achievements WHERE id = ?", ACHIEVEMENT_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Achievement>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get achievement")
        })
    }

    async fn create(&self, input: &AchievementInput) -> Result<Achievement> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                "INSERT INTO achievements (title, description, year, level, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.year)
            .bind(&input.level)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create achievement")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("Achievement missing after insert")
    }

    async fn update(&self, id: i64, input: &AchievementInput) -> Result<Option<Achievement>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                "UPDATE achievements SET title = ?, description = ?, year = ?, level = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.year)
            .bind(&input.level)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update achievement")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM achievements WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete achievement")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "achievements").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn input(title: &str, year: i32) -> AchievementInput {
        AchievementInput {
            title: title.to_string(),
            description: None,
            year,
            level: "kabupaten".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_newest_year_first() {
        let repo = SqlxAchievementRepository::new(migrated_pool().await);
        repo.create(&input("Desa Wisata Terbaik", 2022)).await.unwrap();
        repo.create(&input("Juara Lomba Desa", 2024)).await.unwrap();

        let list = repo.list().await.unwrap();
        assert_eq!(list[0].year, 2024);
        assert_eq!(list[1].level, "kabupaten");
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let repo = SqlxAchievementRepository::new(migrated_pool().await);
        assert!(repo.update(1, &input("X", 2020)).await.unwrap().is_none());
        assert!(!repo.delete(1).await.unwrap());
    }
}
