//! Village potential repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{PotentialInput, VillagePotential};

const POTENTIAL_COLUMNS: &str = "id, title, slug, category, description, created_at, updated_at";

#[async_trait]
pub trait PotentialRepository: Send + Sync {
    /// Ordered by category then title
    async fn list(&self, category: Option<&str>) -> Result<Vec<VillagePotential>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<VillagePotential>>;

    async fn create(&self, input: &PotentialInput, slug: &str) -> Result<VillagePotential>;

    async fn update(&self, id: i64, input: &PotentialInput, slug: &str) -> Result<Option<VillagePotential>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxPotentialRepository {
    pool: DynDatabasePool,
}

impl SqlxPotentialRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PotentialRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PotentialRepository for SqlxPotentialRepository {
    async fn list(&self, category: Option<&str>) -> Result<Vec<VillagePotential>> {
        let category = category.filter(|c| !c.is_empty());
        let filter = if category.is_some() { "WHERE LOWER(category) = LOWER(?)" } else { "" };
        let sql = format!(
            "SELECT {} FROM village_potentials {} ORDER BY category, title",
            POTENTIAL_COLUMNS, filter
        );
        on_pool!(self.pool, |db| {
            let mut query = sqlx::query_as::<_, VillagePotential>(&sql);
            if let Some(c) = category {
                query = query.bind(c);
            }
            query
                .fetch_all(db)
                .await
                .context("Failed to list village potentials")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<VillagePotential>> {
        let sql = format!("SELECT {} FROM village_potentials WHERE id = ?", POTENTIAL_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, VillagePotential>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get village potential")
        })
    }

    async fn create(&self, input: &PotentialInput, slug: &str) -> Result<VillagePotential> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                "INSERT INTO village_potentials (title, slug, category, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.title)
            .bind(slug)
            .bind(&input.category)
            .bind(&input.description)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create village potential")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("Village potential missing after insert")
    }

    async fn update(&self, id: i64, input: &PotentialInput, slug: &str) -> Result<Option<VillagePotential>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                "UPDATE village_potentials SET title = ?, slug = ?, category = ?, description = ?, updated_at = ?
                 WHERE id = ?",
            )
            .bind(&input.title)
            .bind(slug)
            .bind(&input.category)
            .bind(&input.description)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update village potential")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM village_potentials WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete village potential")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "village_potentials").await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "village_potentials", slug, exclude_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn input(title: &str, category: &str) -> PotentialInput {
        PotentialInput {
            title: title.to_string(),
            slug: None,
            category: category.to_string(),
            description: "Potensi unggulan".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let repo = SqlxPotentialRepository::new(migrated_pool().await);
        repo.create(&input("Kopi Robusta", "pertanian"), "kopi-robusta").await.unwrap();
        repo.create(&input("Air Terjun", "alam"), "air-terjun").await.unwrap();
        repo.create(&input("Cengkeh", "pertanian"), "cengkeh").await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all[0].category, "alam");

        let farming = repo.list(Some("PERTANIAN")).await.unwrap();
        let titles: Vec<&str> = farming.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Cengkeh", "Kopi Robusta"]);
    }
}
