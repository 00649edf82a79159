//! Village profile repository
//!
//! Key/value rows in `village_profiles`, grouped by section.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::{on_pool, DynDatabasePool};
use crate::models::VillageProfile;

const PROFILE_COLUMNS: &str = "id, profile_key, section, value, created_at, updated_at";

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// All entries ordered by section then key
    async fn list_all(&self) -> Result<Vec<VillageProfile>>;

    async fn list_section(&self, section: &str) -> Result<Vec<VillageProfile>>;

    async fn get(&self, key: &str) -> Result<Option<VillageProfile>>;

    /// Insert or replace the value (and section) of `key`
    async fn upsert(&self, key: &str, section: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

pub struct SqlxProfileRepository {
    pool: DynDatabasePool,
}

impl SqlxProfileRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn list_all(&self) -> Result<Vec<VillageProfile>> {
        let sql = format!(
            "SELECT {} FROM village_profiles ORDER BY section, profile_key",
            PROFILE_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, VillageProfile>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list village profile")
        })
    }

    async fn list_section(&self, section: &str) -> Result<Vec<VillageProfile>> {
        let sql = format!(
            "SELECT {} FROM village_profiles WHERE section = ? ORDER BY profile_key",
            PROFILE_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, VillageProfile>(&sql)
                .bind(section)
                .fetch_all(db)
                .await
                .context("Failed to list village profile section")
        })
    }

    async fn get(&self, key: &str) -> Result<Option<VillageProfile>> {
        let sql = format!(
            "SELECT {} FROM village_profiles WHERE profile_key = ?",
            PROFILE_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, VillageProfile>(&sql)
                .bind(key)
                .fetch_optional(db)
                .await
                .context("Failed to get village profile entry")
        })
    }

    async fn upsert(&self, key: &str, section: &str, value: &str) -> Result<()> {
        let sql = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                "INSERT INTO village_profiles (profile_key, section, value, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(profile_key) DO UPDATE SET
                    section = excluded.section, value = excluded.value, updated_at = excluded.updated_at"
            }
            DatabaseDriver::Mysql => {
                "INSERT INTO village_profiles (profile_key, section, value, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON DUPLICATE KEY UPDATE
                    section = VALUES(section), value = VALUES(value), updated_at = VALUES(updated_at)"
            }
        };
        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(sql)
                .bind(key)
                .bind(section)
                .bind(value)
                .bind(now)
                .bind(now)
                .execute(db)
                .await
                .with_context(|| format!("Failed to save village profile entry {}", key))?;
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("DELETE FROM village_profiles WHERE profile_key = ?")
                .bind(key)
                .execute(db)
                .await
                .context("Failed to delete village profile entry")?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    #[tokio::test]
    async fn test_upsert_and_sections() {
        let repo = SqlxProfileRepository::new(migrated_pool().await);

        repo.upsert("visi", "visi_misi", "Desa mandiri").await.unwrap();
        repo.upsert("misi", "visi_misi", "Gotong royong").await.unwrap();
        repo.upsert("visi", "visi_misi", "Desa wisata mandiri").await.unwrap();

        let section = repo.list_section("visi_misi").await.unwrap();
        assert_eq!(section.len(), 2);
        assert_eq!(section[0].key, "misi");
        assert_eq!(repo.get("visi").await.unwrap().unwrap().value, "Desa wisata mandiri");

        // seeded `nama_desa` plus the two above
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let repo = SqlxProfileRepository::new(migrated_pool().await);
        repo.upsert("luas_wilayah", "geografis", "512 ha").await.unwrap();
        repo.delete("luas_wilayah").await.unwrap();
        assert!(repo.get("luas_wilayah").await.unwrap().is_none());
    }
}
