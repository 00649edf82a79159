//! Gallery service
//!
//! Albums whose images are media rows of type `gallery`.

use std::sync::Arc;
use std::time::Duration;

use super::slug::resolve_slug;
use super::{cached, invalidate, require, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::GalleryRepository;
use crate::models::{EntityType, Gallery, GalleryDetail, GalleryInput, ListParams, PagedResult};

const CACHE_PREFIX: &str = "galleries:";

pub struct GalleryService {
    repo: Arc<dyn GalleryRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl GalleryService {
    pub fn new(repo: Arc<dyn GalleryRepository>, media: Arc<MediaService>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            media,
            cache,
            cache_ttl,
        }
    }

    /// Albums, most recently taken first
    pub async fn list(&self, params: ListParams) -> Result<PagedResult<Gallery>, ServiceError> {
        let key = format!("galleries:list:{}:{}", params.page, params.per_page);
        cached(&self.cache, &key, self.cache_ttl, || async {
            Ok(self.repo.list(&params).await?)
        })
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Gallery, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Gallery", id))
    }

    pub async fn get_detail(&self, id: i64) -> Result<GalleryDetail, ServiceError> {
        let gallery = self.get(id).await?;
        let images = self.media.list_for_entity(EntityType::Gallery, id).await?;
        Ok(GalleryDetail { gallery, images })
    }

    pub async fn get_detail_by_slug(&self, slug: &str) -> Result<GalleryDetail, ServiceError> {
        let gallery = self
            .repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Gallery", slug))?;
        let images = self.media.list_for_entity(EntityType::Gallery, gallery.id).await?;
        Ok(GalleryDetail { gallery, images })
    }

    pub async fn create(&self, input: GalleryInput) -> Result<Gallery, ServiceError> {
        let input = normalize(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.title, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let gallery = self.repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = gallery.id, slug = %gallery.slug, "Gallery created");
        Ok(gallery)
    }

    pub async fn update(&self, id: i64, input: GalleryInput) -> Result<Gallery, ServiceError> {
        let existing = self.get(id).await?;
        let input = normalize(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.title,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let gallery = self
            .repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Gallery", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(gallery)
    }

    /// Delete an album and all of its images
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        let removed = self.media.delete_for_entity(EntityType::Gallery, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Gallery", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, images = removed, "Gallery deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }
}

fn normalize(mut input: GalleryInput) -> Result<GalleryInput, ServiceError> {
    require("Title", &input.title)?;
    input.title = input.title.trim().to_string();
    input.description = input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::SqlxGalleryRepository;
    use crate::services::media::test_support::{image, media_service, MemoryImageHost};
    use crate::services::test_support;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (GalleryService, Arc<MediaService>, Arc<MemoryImageHost>) {
        let pool = migrated_pool().await;
        let (media, host) = media_service(pool.clone());
        let service = GalleryService::new(SqlxGalleryRepository::boxed(pool), media.clone(), test_support::cache());
        (service, media, host)
    }

    fn album(title: &str) -> GalleryInput {
        GalleryInput {
            title: title.to_string(),
            slug: None,
            description: Some("Dokumentasi kegiatan".to_string()),
            taken_at: None,
        }
    }

    #[tokio::test]
    async fn test_detail_includes_images_in_order() {
        let (service, media, _) = setup().await;
        let gallery = service.create(album("Upacara 17 Agustus")).await.unwrap();
        let first = media.attach(EntityType::Gallery, gallery.id, &image("1.jpg"), None).await.unwrap();
        let second = media.attach(EntityType::Gallery, gallery.id, &image("2.jpg"), None).await.unwrap();

        let detail = service.get_detail_by_slug("upacara-17-agustus").await.unwrap();
        assert_eq!(detail.gallery.id, gallery.id);
        assert_eq!(detail.images.iter().map(|m| m.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_list_newest_taken_first() {
        let (service, _, _) = setup().await;
        let mut old = album("Panen 2022");
        old.taken_at = Some(Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap());
        service.create(old).await.unwrap();
        let mut recent = album("Panen 2024");
        recent.taken_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        service.create(recent).await.unwrap();

        let page = service.list(ListParams::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "Panen 2024");
    }

    #[tokio::test]
    async fn test_update_validation_and_slug() {
        let (service, _, _) = setup().await;
        let gallery = service.create(album("Kirab")).await.unwrap();
        service.create(album("Lomba")).await.unwrap();

        assert!(matches!(
            service.update(gallery.id, album("  ")).await,
            Err(ServiceError::Validation(_))
        ));

        let mut clash = album("Kirab");
        clash.slug = Some("lomba".to_string());
        assert!(matches!(service.update(gallery.id, clash).await, Err(ServiceError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_images() {
        let (service, media, host) = setup().await;
        let gallery = service.create(album("Bersih Desa")).await.unwrap();
        media.attach(EntityType::Gallery, gallery.id, &image("a.jpg"), None).await.unwrap();
        media.attach(EntityType::Gallery, gallery.id, &image("b.jpg"), None).await.unwrap();

        service.delete(gallery.id).await.unwrap();
        assert_eq!(host.removed.lock().unwrap().len(), 2);
        assert!(matches!(service.get_detail(gallery.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_image_cleanup_keeps_gallery() {
        let pool = migrated_pool().await;
        let (media, _) = media_service(pool.clone());
        let service = GalleryService::new(SqlxGalleryRepository::boxed(pool.clone()), media.clone(), test_support::cache());
        let gallery = service.create(album("Sedekah Bumi")).await.unwrap();
        media.attach(EntityType::Gallery, gallery.id, &image("a.jpg"), None).await.unwrap();

        pool.execute("DROP TABLE media").await.unwrap();
        assert!(service.delete(gallery.id).await.is_err());
        assert_eq!(service.get(gallery.id).await.unwrap().title, "Sedekah Bumi");

        assert!(matches!(service.delete(gallery.id + 100).await, Err(ServiceError::NotFound(_))));
    }
}
