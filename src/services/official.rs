//! Government official service

use std::sync::Arc;
use std::time::Duration;

use super::{cached, invalidate, require, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::OfficialRepository;
use crate::models::{EntityType, GovernmentOfficial, OfficialInput};

const CACHE_PREFIX: &str = "officials:";

pub struct OfficialService {
    repo: Arc<dyn OfficialRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl OfficialService {
    pub fn new(repo: Arc<dyn OfficialRepository>, media: Arc<MediaService>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            media,
            cache,
            cache_ttl,
        }
    }

    /// Active officials by `sort_order`
    pub async fn list_public(&self) -> Result<Vec<GovernmentOfficial>, ServiceError> {
        cached(&self.cache, "officials:public", self.cache_ttl, || async {
            Ok(self.repo.list(true).await?)
        })
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<GovernmentOfficial>, ServiceError> {
        Ok(self.repo.list(false).await?)
    }

    pub async fn get(&self, id: i64) -> Result<GovernmentOfficial, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Official", id))
    }

    pub async fn create(&self, input: OfficialInput) -> Result<GovernmentOfficial, ServiceError> {
        let input = normalize(input)?;
        let official = self.repo.create(&input).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = official.id, position = %official.position, "Official created");
        Ok(official)
    }

    pub async fn update(&self, id: i64, input: OfficialInput) -> Result<GovernmentOfficial, ServiceError> {
        let input = normalize(input)?;
        let official = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Official", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(official)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.media.delete_for_entity(EntityType::Official, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Official", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "Official deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }
}

fn normalize(mut input: OfficialInput) -> Result<OfficialInput, ServiceError> {
    require("Name", &input.name)?;
    require("Position", &input.position)?;
    if input.sort_order < 0 {
        return Err(ServiceError::validation("Sort order cannot be negative"));
    }
    input.name = input.name.trim().to_string();
    input.position = input.position.trim().to_string();
    input.photo = input.photo.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    input.period = input.period.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::SqlxOfficialRepository;
    use crate::services::media::test_support::{image, media_service};
    use crate::services::test_support;

    async fn setup_test_service() -> OfficialService {
        let pool = migrated_pool().await;
        let (media, _) = media_service(pool.clone());
        OfficialService::new(SqlxOfficialRepository::boxed(pool), media, test_support::cache())
    }

    fn input(name: &str, position: &str, sort_order: i32, is_active: bool) -> OfficialInput {
        OfficialInput {
            name: name.to_string(),
            position: position.to_string(),
            photo: None,
            period: Some("2019-2025".to_string()),
            sort_order,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_public_list_is_active_and_ordered() {
        let service = setup_test_service().await;
        service.create(input("Sri Wahyuni", "Sekretaris Desa", 2, true)).await.unwrap();
        service.create(input("Bambang", "Kepala Desa", 1, true)).await.unwrap();
        service.create(input("Joko", "Kaur Umum", 3, false)).await.unwrap();

        let public = service.list_public().await.unwrap();
        assert_eq!(public.len(), 2);
        assert_eq!(public[0].position, "Kepala Desa");
        assert_eq!(service.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = setup_test_service().await;
        assert!(matches!(
            service.create(input(" ", "Kepala Desa", 0, true)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(service.create(input("Bambang", "", 0, true)).await.is_err());
        assert!(service.create(input("Bambang", "Kepala Desa", -1, true)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_refreshes_public_list() {
        let service = setup_test_service().await;
        let official = service.create(input("Joko", "Kaur Umum", 1, true)).await.unwrap();
        assert_eq!(service.list_public().await.unwrap().len(), 1);

        let updated = service
            .update(official.id, input("Joko Santoso", "Kaur Umum", 1, false))
            .await
            .unwrap();
        assert_eq!(updated.name, "Joko Santoso");
        assert!(service.list_public().await.unwrap().is_empty());

        assert!(matches!(
            service.update(999, input("X", "Y", 0, true)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_media() {
        let pool = migrated_pool().await;
        let (media, host) = media_service(pool.clone());
        let service = OfficialService::new(
            SqlxOfficialRepository::boxed(pool),
            media.clone(),
            test_support::cache(),
        );

        let official = service.create(input("Bambang", "Kepala Desa", 1, true)).await.unwrap();
        media.attach(EntityType::Official, official.id, &image("foto.jpg"), None).await.unwrap();

        service.delete(official.id).await.unwrap();
        assert!(media.list_for_entity(EntityType::Official, official.id).await.unwrap().is_empty());
        assert_eq!(host.removed.lock().unwrap().len(), 1);
        assert!(matches!(service.get(official.id).await, Err(ServiceError::NotFound(_))));
    }
}
