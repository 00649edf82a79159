//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod achievement;
pub mod event;
pub mod gallery;
pub mod media;
pub mod news;
pub mod news_category;
pub mod official;
pub mod potential;
pub mod profile;
pub mod session;
pub mod settings;
pub mod tourism;
pub mod tourism_house;
pub mod umkm;
pub mod user;

pub use achievement::{AchievementRepository, SqlxAchievementRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use gallery::{GalleryRepository, SqlxGalleryRepository};
pub use media::{MediaRepository, SqlxMediaRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use news_category::{NewsCategoryRepository, SqlxNewsCategoryRepository};
pub use official::{OfficialRepository, SqlxOfficialRepository};
pub use potential::{PotentialRepository, SqlxPotentialRepository};
pub use profile::{ProfileRepository, SqlxProfileRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use settings::{Setting, SettingsRepository, SqlxSettingsRepository};
pub use tourism::{
    SqlxTourismCategoryRepository, SqlxTourismPackageRepository, TourismCategoryRepository,
    TourismPackageRepository,
};
pub use tourism_house::{SqlxTourismHouseRepository, TourismHouseRepository};
pub use umkm::{SqlxUmkmRepository, UmkmRepository};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};
use sqlx::Row;

use crate::db::{on_pool, DynDatabasePool};

/// Check whether `slug` is already used in `table`, ignoring the row `exclude_id`.
///
/// `table` must be one of the crate's own table names.
pub(crate) async fn slug_taken(
    pool: &DynDatabasePool,
    table: &'static str,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) AS count FROM {} WHERE slug = ? AND id <> ?",
        table
    );
    on_pool!(pool, |db| {
        let row = sqlx::query(&sql)
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(db)
            .await
            .with_context(|| format!("Failed to check slug in {}", table))?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    })
}

/// Count every row of `table`.
pub(crate) async fn count_rows(pool: &DynDatabasePool, table: &'static str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) AS count FROM {}", table);
    on_pool!(pool, |db| {
        let row = sqlx::query(&sql)
            .fetch_one(db)
            .await
            .with_context(|| format!("Failed to count {}", table))?;
        Ok(row.get::<i64, _>("count"))
    })
}
