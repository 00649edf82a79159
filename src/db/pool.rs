//! Connection pools for the two supported backends
//!
//! SQLite is the default for a single village server; MySQL is used on
//! shared hosting. Both sit behind [`DatabasePool`] so repositories and
//! migrations never name a concrete backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_DEFAULT_CONNECTIONS: u32 = 8;
const MYSQL_DEFAULT_CONNECTIONS: u32 = 16;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run one statement that returns no rows, e.g. a migration step
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Round-trip a trivial query
    async fn ping(&self) -> Result<()>;

    async fn close(&self);

    fn driver(&self) -> DatabaseDriver;

    fn as_sqlite(&self) -> Option<&SqlitePool>;

    fn as_mysql(&self) -> Option<&MySqlPool>;
}

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database file at `url`.
    ///
    /// `url` may be a bare path, a `sqlite:` URL or `:memory:`. An in-memory
    /// database lives in a single connection so every query sees the same data.
    pub async fn connect(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let in_memory = url == ":memory:" || url.starts_with("sqlite::memory:");

        let base = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
            let path = path.split('?').next().unwrap_or(path);
            ensure_parent_dir(Path::new(path))?;
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };
        let options = base.foreign_keys(true).busy_timeout(SQLITE_BUSY_TIMEOUT);

        let max_connections = if in_memory {
            1
        } else {
            max_connections.unwrap_or(SQLITE_DEFAULT_CONNECTIONS)
        };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT);
        if in_memory {
            // Dropping the only connection drops the database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database: {}", url))?;

        Ok(Self { pool })
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display())),
        _ => Ok(()),
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let done = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute: {}", sql))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to `url`; the `mysql://` scheme is added when missing
    pub async fn connect(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections.unwrap_or(MYSQL_DEFAULT_CONNECTIONS))
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&url)
            .await
            .context("Failed to connect to MySQL")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let done = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute: {}", sql))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Connect to the configured backend
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let pool: DynDatabasePool = match config.driver {
        DatabaseDriver::Sqlite => {
            Arc::new(SqliteDatabase::connect(&config.url, config.max_connections).await?)
        }
        DatabaseDriver::Mysql => {
            Arc::new(MysqlDatabase::connect(&config.url, config.max_connections).await?)
        }
    };
    Ok(pool)
}

/// Empty in-memory SQLite database
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
        max_connections: None,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_shares_one_database() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_mysql().is_none());
        pool.ping().await.unwrap();

        pool.execute("CREATE TABLE dusun (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        let inserted = pool
            .execute("INSERT INTO dusun (name) VALUES ('Krajan'), ('Ngasem')")
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dusun")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let pool = create_test_pool().await.unwrap();
        pool.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)").await.unwrap();
        pool.execute("CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER NOT NULL REFERENCES parent(id))")
            .await
            .unwrap();

        assert!(pool.execute("INSERT INTO child (parent_id) VALUES (42)").await.is_err());
    }

    #[tokio::test]
    async fn test_file_database_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("desa").join("banyuanyar.db");

        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: format!("sqlite:{}", path.display()),
            max_connections: Some(2),
        };
        let pool = create_pool(&config).await.unwrap();
        pool.ping().await.unwrap();
        assert!(path.exists());
        pool.close().await;
    }

    #[tokio::test]
    #[ignore = "needs a MySQL server in MYSQL_TEST_URL"]
    async fn test_mysql_ping() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/banyuanyar_test".to_string());
        let config = DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
            max_connections: Some(2),
        };

        let pool = create_pool(&config).await.unwrap();
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        pool.ping().await.unwrap();
    }
}
