//! Database migrations module
//!
//! Code-based migrations for the Banyuanyar CMS. Every migration is embedded in
//! the binary as SQL strings, one variant for SQLite and one for MySQL.
//!
//! ```ignore
//! use banyuanyar::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Integer columns are `BIGINT` on MySQL so they decode as `i64` everywhere,
//! except ordering/year/capacity columns which are `INT` and map to `i32`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::{on_pool, DynDatabasePool};
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_key_value_tables",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS site_settings (
                setting_key VARCHAR(100) PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS village_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_key VARCHAR(100) NOT NULL UNIQUE,
                section VARCHAR(50) NOT NULL DEFAULT 'umum',
                value TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_village_profiles_section ON village_profiles(section);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS site_settings (
                setting_key VARCHAR(100) PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS village_profiles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                profile_key VARCHAR(100) NOT NULL UNIQUE,
                section VARCHAR(50) NOT NULL DEFAULT 'umum',
                value TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_village_profiles_section ON village_profiles(section);
        "#,
    },
    Migration {
        version: 4,
        name: "create_government_officials",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS government_officials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(150) NOT NULL,
                position VARCHAR(150) NOT NULL,
                photo VARCHAR(500),
                period VARCHAR(50),
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS government_officials (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(150) NOT NULL,
                position VARCHAR(150) NOT NULL,
                photo VARCHAR(500),
                period VARCHAR(50),
                sort_order INT NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_news",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS news_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(120) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER,
                author_id INTEGER,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP,
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES news_categories(id) ON DELETE SET NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_news_category_id ON news(category_id);
            CREATE INDEX IF NOT EXISTS idx_news_status ON news(status);
            CREATE INDEX IF NOT EXISTS idx_news_published_at ON news(published_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS news_categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(120) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS news (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                category_id BIGINT NULL,
                author_id BIGINT NULL,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content MEDIUMTEXT NOT NULL,
                excerpt TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP NULL,
                view_count BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES news_categories(id) ON DELETE SET NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_news_category_id ON news(category_id);
            CREATE INDEX idx_news_status ON news(status);
            CREATE INDEX idx_news_published_at ON news(published_at);
        "#,
    },
    Migration {
        version: 6,
        name: "create_events",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                location VARCHAR(255),
                start_at TIMESTAMP NOT NULL,
                end_at TIMESTAMP,
                is_published BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_events_start_at ON events(start_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS events (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                location VARCHAR(255),
                start_at DATETIME NOT NULL,
                end_at DATETIME NULL,
                is_published BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_events_start_at ON events(start_at);
        "#,
    },
    Migration {
        version: 7,
        name: "create_tourism",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tourism_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(120) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS tourism_packages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                price INTEGER NOT NULL DEFAULT 0,
                duration VARCHAR(100),
                facilities TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES tourism_categories(id) ON DELETE RESTRICT
            );
            CREATE INDEX IF NOT EXISTS idx_tourism_packages_category_id ON tourism_packages(category_id);
            CREATE TABLE IF NOT EXISTS tourism_houses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                address VARCHAR(255),
                price_per_night INTEGER NOT NULL DEFAULT 0,
                capacity INTEGER NOT NULL DEFAULT 1,
                contact VARCHAR(100),
                latitude REAL,
                longitude REAL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tourism_categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(120) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS tourism_packages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                category_id BIGINT NOT NULL,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                price BIGINT NOT NULL DEFAULT 0,
                duration VARCHAR(100),
                facilities TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES tourism_categories(id) ON DELETE RESTRICT
            );
            CREATE INDEX idx_tourism_packages_category_id ON tourism_packages(category_id);
            CREATE TABLE IF NOT EXISTS tourism_houses (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                address VARCHAR(255),
                price_per_night BIGINT NOT NULL DEFAULT 0,
                capacity INT NOT NULL DEFAULT 1,
                contact VARCHAR(100),
                latitude DOUBLE NULL,
                longitude DOUBLE NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_galleries_and_media",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS galleries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT,
                taken_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS media (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_type VARCHAR(40) NOT NULL,
                entity_id INTEGER NOT NULL,
                url VARCHAR(1000) NOT NULL,
                storage_key VARCHAR(500) NOT NULL,
                file_name VARCHAR(255) NOT NULL,
                mime_type VARCHAR(100) NOT NULL,
                size INTEGER NOT NULL DEFAULT 0,
                caption VARCHAR(500),
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_media_entity ON media(entity_type, entity_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS galleries (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT,
                taken_at DATETIME NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS media (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                entity_type VARCHAR(40) NOT NULL,
                entity_id BIGINT NOT NULL,
                url VARCHAR(1000) NOT NULL,
                storage_key VARCHAR(500) NOT NULL,
                file_name VARCHAR(255) NOT NULL,
                mime_type VARCHAR(100) NOT NULL,
                size BIGINT NOT NULL DEFAULT 0,
                caption VARCHAR(500),
                sort_order INT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_media_entity ON media(entity_type, entity_id);
        "#,
    },
    Migration {
        version: 9,
        name: "create_umkm",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS umkm (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                owner_name VARCHAR(150) NOT NULL,
                category VARCHAR(100) NOT NULL,
                description TEXT NOT NULL,
                address VARCHAR(255),
                phone VARCHAR(50),
                latitude REAL,
                longitude REAL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS umkm_products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                umkm_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                price INTEGER NOT NULL DEFAULT 0,
                is_available BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (umkm_id) REFERENCES umkm(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_umkm_products_umkm_id ON umkm_products(umkm_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS umkm (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                owner_name VARCHAR(150) NOT NULL,
                category VARCHAR(100) NOT NULL,
                description TEXT NOT NULL,
                address VARCHAR(255),
                phone VARCHAR(50),
                latitude DOUBLE NULL,
                longitude DOUBLE NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS umkm_products (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                umkm_id BIGINT NOT NULL,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                price BIGINT NOT NULL DEFAULT 0,
                is_available BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (umkm_id) REFERENCES umkm(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_umkm_products_umkm_id ON umkm_products(umkm_id);
        "#,
    },
    Migration {
        version: 10,
        name: "create_potentials_and_achievements",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS village_potentials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                category VARCHAR(100) NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS achievements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                year INTEGER NOT NULL,
                level VARCHAR(50) NOT NULL DEFAULT 'desa',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS village_potentials (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                category VARCHAR(100) NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS achievements (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                year INT NOT NULL,
                level VARCHAR(50) NOT NULL DEFAULT 'desa',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 11,
        name: "seed_site_settings",
        up_sqlite: r#"
            INSERT OR IGNORE INTO site_settings (setting_key, value) VALUES ('site_name', 'Desa Banyuanyar');
            INSERT OR IGNORE INTO site_settings (setting_key, value) VALUES ('site_tagline', 'Desa wisata, budaya, dan UMKM');
            INSERT OR IGNORE INTO site_settings (setting_key, value) VALUES ('news_per_page', '9');
            INSERT OR IGNORE INTO village_profiles (profile_key, section, value) VALUES ('nama_desa', 'umum', 'Banyuanyar');
        "#,
        up_mysql: r#"
            INSERT IGNORE INTO site_settings (setting_key, value) VALUES ('site_name', 'Desa Banyuanyar');
            INSERT IGNORE INTO site_settings (setting_key, value) VALUES ('site_tagline', 'Desa wisata, budaya, dan UMKM');
            INSERT IGNORE INTO site_settings (setting_key, value) VALUES ('news_per_page', '9');
            INSERT IGNORE INTO village_profiles (profile_key, section, value) VALUES ('nama_desa', 'umum', 'Banyuanyar');
        "#,
    },
];

/// Run all pending migrations
///
/// Creates the `_migrations` tracking table if needed, then applies every
/// migration whose version has not been recorded yet.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&(migration.version as i64)) {
            tracing::info!("Applying migration {}: {}", migration.version, migration.name);
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    on_pool!(pool, |db| {
        let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(db)
            .await?;

        Ok(rows
            .iter()
            .map(|row| MigrationRecord {
                version: row.get("version"),
                name: row.get("name"),
                applied_at: row.get("applied_at"),
            })
            .collect())
    })
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    on_pool!(pool, |db| {
        for statement in split_sql_statements(sql) {
            sqlx::query(statement)
                .execute(db)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }

        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(migration.version as i64)
            .bind(migration.name)
            .execute(db)
            .await?;

        Ok(())
    })
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        let first = run_migrations(&pool).await.unwrap();
        assert_eq!(first, total_migrations());

        let second = run_migrations(&pool).await.unwrap();
        assert_eq!(second, 0);
        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pending_count_before_migrating() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), total_migrations());
        assert!(!is_up_to_date(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_seeded_site_settings() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        let row = sqlx::query("SELECT value FROM site_settings WHERE setting_key = 'site_name'")
            .fetch_one(sqlite)
            .await
            .unwrap();
        let value: String = row.get("value");
        assert_eq!(value, "Desa Banyuanyar");
    }

    #[tokio::test]
    async fn test_product_requires_existing_umkm() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        let result = sqlx::query("INSERT INTO umkm_products (umkm_id, name, price) VALUES (?, ?, ?)")
            .bind(999i64)
            .bind("Keripik Pisang")
            .bind(15000i64)
            .execute(sqlite)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_products_cascade_with_umkm() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO umkm (name, slug, owner_name, category, description) VALUES ('Kopi Lereng', 'kopi-lereng', 'Pak Darto', 'kuliner', 'Kopi robusta')")
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query("INSERT INTO umkm_products (umkm_id, name, price) VALUES (1, 'Kopi Bubuk 250g', 25000)")
            .execute(sqlite)
            .await
            .unwrap();

        sqlx::query("DELETE FROM umkm WHERE id = 1").execute(sqlite).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS count FROM umkm_products")
            .fetch_one(sqlite)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 0);
    }

    #[tokio::test]
    async fn test_tourism_category_delete_restricted() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO tourism_categories (name, slug) VALUES ('Edukasi', 'edukasi')")
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query("INSERT INTO tourism_packages (category_id, name, slug, description) VALUES (1, 'Petik Kopi', 'petik-kopi', 'Belajar memetik kopi')")
            .execute(sqlite)
            .await
            .unwrap();

        let result = sqlx::query("DELETE FROM tourism_categories WHERE id = 1")
            .execute(sqlite)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_get_migration() {
        assert_eq!(get_migration(1).map(|m| m.name), Some("create_users"));
        assert!(get_migration(999).is_none());
    }

    #[test]
    fn test_migration_versions_are_sequential() {
        for (idx, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, idx + 1);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let statements = split_sql_statements("CREATE TABLE a (id INT); CREATE TABLE b (id INT);");
        assert_eq!(statements.len(), 2);

        let statements = split_sql_statements("-- Comment\nCREATE TABLE a (id INT);\n-- trailing");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }
}
