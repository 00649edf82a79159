//! Database layer
//!
//! This module provides database abstraction for the Banyuanyar CMS.
//! It supports:
//! - SQLite (default, for single-binary deployment on the village server)
//! - MySQL (for hosted deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Architecture
//!
//! The `DatabasePool` trait hides the backend. Repositories run the same SQL
//! against either backend through the [`on_pool!`] macro, which expands the
//! query body once per concrete sqlx pool type.
//!
//! ```ignore
//! use banyuanyar::config::DatabaseConfig;
//! use banyuanyar::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Run a query body against whichever backend `$db` holds.
///
/// Inside the body `$pool` is bound to `&SqlitePool` or `&MySqlPool`. The body
/// must evaluate to an `anyhow::Result`, and SQL inside it must be valid for
/// both backends.
macro_rules! on_pool {
    ($db:expr, |$pool:ident| $body:expr) => {{
        match $db.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                let $pool = $db
                    .as_sqlite()
                    .ok_or_else(|| anyhow::anyhow!("SQLite pool unavailable"))?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                let $pool = $db
                    .as_mysql()
                    .ok_or_else(|| anyhow::anyhow!("MySQL pool unavailable"))?;
                $body
            }
        }
    }};
}

pub(crate) use on_pool;

/// Uniform access to the id generated by an `INSERT`
pub trait LastInsertId {
    fn insert_id(&self) -> i64;
}

impl LastInsertId for sqlx::sqlite::SqliteQueryResult {
    fn insert_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl LastInsertId for sqlx::mysql::MySqlQueryResult {
    fn insert_id(&self) -> i64 {
        self.last_insert_id() as i64
    }
}

/// Build `?, ?, ?` for an `IN (...)` clause
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
