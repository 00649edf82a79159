//! Settings repository
//!
//! Key/value storage for site-wide settings (`site_settings` table).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::{on_pool, DynDatabasePool};

/// A setting key-value pair
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Setting {
    #[sqlx(rename = "setting_key")]
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for settings operations
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get a single setting by key
    async fn get(&self, key: &str) -> Result<Option<Setting>>;

    /// Get all settings
    async fn get_all(&self) -> Result<Vec<Setting>>;

    /// Set a single setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Set multiple settings at once
    async fn set_many(&self, settings: &HashMap<String, String>) -> Result<()>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;
}

/// SQLx-based settings repository
pub struct SqlxSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>> {
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Setting>(
                "SELECT setting_key, value, updated_at FROM site_settings WHERE setting_key = ?",
            )
            .bind(key)
            .fetch_optional(db)
            .await
            .context("Failed to get setting")
        })
    }

    async fn get_all(&self) -> Result<Vec<Setting>> {
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Setting>(
                "SELECT setting_key, value, updated_at FROM site_settings ORDER BY setting_key",
            )
            .fetch_all(db)
            .await
            .context("Failed to list settings")
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let sql = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                "INSERT INTO site_settings (setting_key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(setting_key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"
            }
            DatabaseDriver::Mysql => {
                "INSERT INTO site_settings (setting_key, value, updated_at) VALUES (?, ?, ?)
                 ON DUPLICATE KEY UPDATE value = VALUES(value), updated_at = VALUES(updated_at)"
            }
        };
        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(sql)
                .bind(key)
                .bind(value)
                .bind(now)
                .execute(db)
                .await
                .with_context(|| format!("Failed to save setting {}", key))?;
            Ok(())
        })
    }

    async fn set_many(&self, settings: &HashMap<String, String>) -> Result<()> {
        for (key, value) in settings {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("DELETE FROM site_settings WHERE setting_key = ?")
                .bind(key)
                .execute(db)
                .await
                .context("Failed to delete setting")?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    #[tokio::test]
    async fn test_seeded_settings_present() {
        let repo = SqlxSettingsRepository::new(migrated_pool().await);
        let site_name = repo.get("site_name").await.unwrap().expect("seeded");
        assert_eq!(site_name.value, "Desa Banyuanyar");
    }

    #[tokio::test]
    async fn test_set_overwrites_and_delete() {
        let repo = SqlxSettingsRepository::new(migrated_pool().await);

        repo.set("contact_phone", "0271-123456").await.unwrap();
        repo.set("contact_phone", "0812-0000-1111").await.unwrap();
        assert_eq!(
            repo.get("contact_phone").await.unwrap().unwrap().value,
            "0812-0000-1111"
        );

        repo.delete("contact_phone").await.unwrap();
        assert!(repo.get("contact_phone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_many() {
        let repo = SqlxSettingsRepository::new(migrated_pool().await);
        let mut values = HashMap::new();
        values.insert("site_name".to_string(), "Banyuanyar".to_string());
        values.insert("contact_email".to_string(), "desa@banyuanyar.id".to_string());
        repo.set_many(&values).await.unwrap();

        let all: HashMap<String, String> = repo
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();
        assert_eq!(all["site_name"], "Banyuanyar");
        assert_eq!(all["contact_email"], "desa@banyuanyar.id");
    }
}
