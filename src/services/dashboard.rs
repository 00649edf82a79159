//! Admin dashboard summary
//!
//! Record counts for the admin home page. Request statistics are added by
//! the API layer, which owns the request counters.

use serde::Serialize;
use std::sync::Arc;

use super::ServiceError;
use crate::cache::{Cache, CacheStats};
use crate::db::repositories::{
    AchievementRepository, EventRepository, GalleryRepository, MediaRepository, NewsRepository,
    OfficialRepository, PotentialRepository, SqlxAchievementRepository, SqlxEventRepository,
    SqlxGalleryRepository, SqlxMediaRepository, SqlxNewsRepository, SqlxOfficialRepository,
    SqlxPotentialRepository, SqlxTourismHouseRepository, SqlxTourismPackageRepository,
    SqlxUmkmRepository, SqlxUserRepository, TourismHouseRepository, TourismPackageRepository,
    UmkmRepository, UserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{ListParams, News, NewsFilter, NewsStatus};

const RECENT_NEWS: u32 = 5;

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub news_published: i64,
    pub news_draft: i64,
    pub news_archived: i64,
    pub events: i64,
    pub tourism_packages: i64,
    pub tourism_houses: i64,
    pub umkm: i64,
    pub umkm_products: i64,
    pub galleries: i64,
    pub media: i64,
    pub officials: i64,
    pub potentials: i64,
    pub achievements: i64,
    pub users: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub counts: EntityCounts,
    /// Most recently created articles of any status
    pub recent_news: Vec<News>,
    pub cache: CacheStats,
}

pub struct DashboardService {
    news: Arc<dyn NewsRepository>,
    events: Arc<dyn EventRepository>,
    packages: Arc<dyn TourismPackageRepository>,
    houses: Arc<dyn TourismHouseRepository>,
    umkm: Arc<dyn UmkmRepository>,
    galleries: Arc<dyn GalleryRepository>,
    media: Arc<dyn MediaRepository>,
    officials: Arc<dyn OfficialRepository>,
    potentials: Arc<dyn PotentialRepository>,
    achievements: Arc<dyn AchievementRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<Cache>,
}

impl DashboardService {
    pub fn new(pool: DynDatabasePool, cache: Arc<Cache>) -> Self {
        Self {
            news: SqlxNewsRepository::boxed(pool.clone()),
            events: SqlxEventRepository::boxed(pool.clone()),
            packages: SqlxTourismPackageRepository::boxed(pool.clone()),
            houses: SqlxTourismHouseRepository::boxed(pool.clone()),
            umkm: SqlxUmkmRepository::boxed(pool.clone()),
            galleries: SqlxGalleryRepository::boxed(pool.clone()),
            media: SqlxMediaRepository::boxed(pool.clone()),
            officials: SqlxOfficialRepository::boxed(pool.clone()),
            potentials: SqlxPotentialRepository::boxed(pool.clone()),
            achievements: SqlxAchievementRepository::boxed(pool.clone()),
            users: SqlxUserRepository::boxed(pool),
            cache,
        }
    }

    pub async fn counts(&self) -> Result<EntityCounts, ServiceError> {
        Ok(EntityCounts {
            news_published: self.news.count_by_status(NewsStatus::Published).await?,
            news_draft: self.news.count_by_status(NewsStatus::Draft).await?,
            news_archived: self.news.count_by_status(NewsStatus::Archived).await?,
            events: self.events.count().await?,
            tourism_packages: self.packages.count().await?,
            tourism_houses: self.houses.count().await?,
            umkm: self.umkm.count().await?,
            umkm_products: self.umkm.count_products().await?,
            galleries: self.galleries.count().await?,
            media: self.media.count().await?,
            officials: self.officials.count().await?,
            potentials: self.potentials.count().await?,
            achievements: self.achievements.count().await?,
            users: self.users.count().await?,
        })
    }

    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let counts = self.counts().await?;
        let recent_news = self
            .news
            .list(&NewsFilter::default(), &ListParams::new(1, RECENT_NEWS))
            .await?
            .items;

        Ok(DashboardSummary {
            counts,
            recent_news,
            cache: self.cache.stats().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, migrated_pool};
    use crate::services::test_support;

    #[tokio::test]
    async fn test_empty_counts() {
        let pool = migrated_pool().await;
        let service = DashboardService::new(pool, test_support::cache());
        assert_eq!(service.counts().await.unwrap(), EntityCounts::default());
    }

    #[tokio::test]
    async fn test_summary_counts_rows() {
        let pool = migrated_pool().await;
        insert_user(&pool, 1).await;
        let sqlite = pool.as_sqlite().unwrap();
        let now = chrono::Utc::now();
        for (slug, status) in [("panen", "published"), ("rapat", "draft")] {
            sqlx::query(
                "INSERT INTO news (title, slug, content, excerpt, status, view_count, created_at, updated_at)
                 VALUES (?, ?, '<p>isi</p>', 'isi', ?, 0, ?, ?)",
            )
            .bind(slug)
            .bind(slug)
            .bind(status)
            .bind(now)
            .bind(now)
            .execute(sqlite)
            .await
            .unwrap();
        }

        let service = DashboardService::new(pool, test_support::cache());
        let summary = service.summary().await.unwrap();
        assert_eq!(summary.counts.news_published, 1);
        assert_eq!(summary.counts.news_draft, 1);
        assert_eq!(summary.counts.users, 1);
        assert_eq!(summary.recent_news.len(), 2);
    }
}
