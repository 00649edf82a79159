//! Tourism house (homestay) repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{TourismHouse, TourismHouseInput};

const HOUSE_COLUMNS: &str = "id, name, slug, description, address, price_per_night, capacity, \
                             contact, latitude, longitude, is_active, created_at, updated_at";

#[async_trait]
pub trait TourismHouseRepository: Send + Sync {
    async fn list(&self, active_only: bool) -> Result<Vec<TourismHouse>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<TourismHouse>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<TourismHouse>>;

    async fn create(&self, input: &TourismHouseInput, slug: &str) -> Result<TourismHouse>;

    async fn update(&self, id: i64, input: &TourismHouseInput, slug: &str) -> Result<Option<TourismHouse>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxTourismHouseRepository {
    pool: DynDatabasePool,
}

impl SqlxTourismHouseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TourismHouseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TourismHouseRepository for SqlxTourismHouseRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<TourismHouse>> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        let sql = format!("SELECT {} FROM tourism_houses {} ORDER BY name, id", HOUSE_COLUMNS, filter);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismHouse>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list tourism houses")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<TourismHouse>> {
        let sql = format!("SELECT {} FROM tourism_houses WHERE id = ?", HOUSE_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismHouse>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get tourism house")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<TourismHouse>> {
        let sql = format!("SELECT {} FROM tourism_houses WHERE slug = ?", HOUSE_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, TourismHouse>(&sql)
                .bind(slug)
                .fetch_optional(db)
                .await
                .context("Failed to get tourism house by slug")
        })
    }

    async fn create(&self, input: &TourismHouseInput, slug: &str) -> Result<TourismHouse> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO tourism_houses (name, slug, description, address, price_per_night, capacity,
                                            contact, latitude, longitude, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.address)
            .bind(input.price_per_night)
            .bind(input.capacity)
            .bind(&input.contact)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_active)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create tourism house")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id)
            .await?
            .context("Tourism house missing after insert")
    }

    async fn update(&self, id: i64, input: &TourismHouseInput, slug: &str) -> Result<Option<TourismHouse>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE tourism_houses
                SET name = ?, slug = ?, description = ?, address = ?, price_per_night = ?, capacity = ?,
                    contact = ?, latitude = ?, longitude = ?, is_active = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.address)
            .bind(input.price_per_night)
            .bind(input.capacity)
            .bind(&input.contact)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_active)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update tourism house")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM tourism_houses WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete tourism house")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "tourism_houses").await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "tourism_houses", slug, exclude_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn input(name: &str, is_active: bool) -> TourismHouseInput {
        TourismHouseInput {
            name: name.to_string(),
            slug: None,
            description: "Rumah joglo dengan kebun".to_string(),
            address: Some("Dusun Krajan RT 02".to_string()),
            price_per_night: 250_000,
            capacity: 4,
            contact: Some("0812-3456-7890".to_string()),
            latitude: Some(-7.5204),
            longitude: Some(110.8263),
            is_active,
        }
    }

    #[tokio::test]
    async fn test_create_keeps_coordinates() {
        let repo = SqlxTourismHouseRepository::new(migrated_pool().await);
        let created = repo.create(&input("Homestay Melati", true), "homestay-melati").await.unwrap();

        assert_eq!(created.capacity, 4);
        assert_eq!(created.latitude, Some(-7.5204));
        assert_eq!(created.longitude, Some(110.8263));
    }

    #[tokio::test]
    async fn test_active_filter_and_delete() {
        let repo = SqlxTourismHouseRepository::new(migrated_pool().await);
        let open = repo.create(&input("Homestay Anggrek", true), "homestay-anggrek").await.unwrap();
        repo.create(&input("Homestay Kenanga", false), "homestay-kenanga").await.unwrap();

        assert_eq!(repo.list(true).await.unwrap().len(), 1);
        assert_eq!(repo.list(false).await.unwrap().len(), 2);

        assert!(repo.delete(open.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
