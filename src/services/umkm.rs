//! UMKM service
//!
//! Small local businesses and their products. Products are always addressed
//! through their UMKM, so a product id from another business is not found.

use std::sync::Arc;
use std::time::Duration;

use super::slug::resolve_slug;
use super::{cached, invalidate, require, require_non_negative, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::UmkmRepository;
use crate::models::{
    validate_coordinates, EntityType, ListParams, PagedResult, Umkm, UmkmDetail, UmkmInput,
    UmkmProduct, UmkmProductInput,
};

const CACHE_PREFIX: &str = "umkm:";

pub struct UmkmService {
    repo: Arc<dyn UmkmRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl UmkmService {
    pub fn new(repo: Arc<dyn UmkmRepository>, media: Arc<MediaService>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            media,
            cache,
            cache_ttl,
        }
    }

    /// Active businesses, optionally of one category
    pub async fn list_public(
        &self,
        category: Option<&str>,
        params: ListParams,
    ) -> Result<PagedResult<Umkm>, ServiceError> {
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        let key = format!(
            "umkm:list:{}:{}:{}",
            category.as_deref().unwrap_or("*"),
            params.page,
            params.per_page
        );
        cached(&self.cache, &key, self.cache_ttl, || async {
            Ok(self.repo.list(category.as_deref(), true, &params).await?)
        })
        .await
    }

    pub async fn list_admin(
        &self,
        category: Option<&str>,
        params: ListParams,
    ) -> Result<PagedResult<Umkm>, ServiceError> {
        Ok(self.repo.list(category, false, &params).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Umkm, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("UMKM", id))
    }

    /// UMKM with every product
    pub async fn get_detail(&self, id: i64) -> Result<UmkmDetail, ServiceError> {
        let umkm = self.get(id).await?;
        let products = self.repo.list_products(id).await?;
        Ok(UmkmDetail { umkm, products })
    }

    /// Active UMKM by slug with its available products
    pub async fn get_public_detail(&self, slug: &str) -> Result<UmkmDetail, ServiceError> {
        let key = format!("umkm:detail:{}", slug);
        let (umkm, products): (Umkm, Vec<UmkmProduct>) =
            cached(&self.cache, &key, self.cache_ttl, || async {
                let umkm = self
                    .repo
                    .get_by_slug(slug)
                    .await?
                    .filter(|u| u.is_active)
                    .ok_or_else(|| ServiceError::not_found("UMKM", slug))?;
                let products = self.repo.list_products(umkm.id).await?;
                Ok((umkm, products))
            })
            .await?;

        let products = products.into_iter().filter(|p| p.is_available).collect();
        Ok(UmkmDetail { umkm, products })
    }

    pub async fn create(&self, input: UmkmInput) -> Result<Umkm, ServiceError> {
        let input = check_umkm(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let umkm = self.repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = umkm.id, slug = %umkm.slug, "UMKM created");
        Ok(umkm)
    }

    pub async fn update(&self, id: i64, input: UmkmInput) -> Result<Umkm, ServiceError> {
        let existing = self.get(id).await?;
        let input = check_umkm(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.name,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let umkm = self
            .repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("UMKM", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(umkm)
    }

    /// Delete a UMKM with its products and every attached image
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        let products = self.repo.list_products(id).await?;
        for product in &products {
            self.media.delete_for_entity(EntityType::UmkmProduct, product.id).await?;
        }
        self.media.delete_for_entity(EntityType::Umkm, id).await?;

        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("UMKM", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, products = products.len(), "UMKM deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }

    // ---- products ----

    pub async fn list_products(&self, umkm_id: i64) -> Result<Vec<UmkmProduct>, ServiceError> {
        self.get(umkm_id).await?;
        Ok(self.repo.list_products(umkm_id).await?)
    }

    pub async fn get_product(&self, umkm_id: i64, product_id: i64) -> Result<UmkmProduct, ServiceError> {
        self.repo
            .get_product(umkm_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    pub async fn create_product(
        &self,
        umkm_id: i64,
        input: UmkmProductInput,
    ) -> Result<UmkmProduct, ServiceError> {
        self.get(umkm_id).await?;
        let input = check_product(input)?;
        let product = self.repo.create_product(umkm_id, &input).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(umkm_id, id = product.id, "UMKM product created");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        umkm_id: i64,
        product_id: i64,
        input: UmkmProductInput,
    ) -> Result<UmkmProduct, ServiceError> {
        let input = check_product(input)?;
        let product = self
            .repo
            .update_product(umkm_id, product_id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(product)
    }

    pub async fn delete_product(&self, umkm_id: i64, product_id: i64) -> Result<(), ServiceError> {
        self.get_product(umkm_id, product_id).await?;
        self.media.delete_for_entity(EntityType::UmkmProduct, product_id).await?;
        if !self.repo.delete_product(umkm_id, product_id).await? {
            return Err(ServiceError::not_found("Product", product_id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn count_products(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count_products().await?)
    }
}

fn check_umkm(mut input: UmkmInput) -> Result<UmkmInput, ServiceError> {
    require("Business name", &input.name)?;
    require("Owner name", &input.owner_name)?;
    require("Category", &input.category)?;
    require("Description", &input.description)?;
    validate_coordinates(input.latitude, input.longitude).map_err(ServiceError::Validation)?;

    input.name = input.name.trim().to_string();
    input.owner_name = input.owner_name.trim().to_string();
    input.category = input.category.trim().to_lowercase();
    input.address = input.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    input.phone = input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    Ok(input)
}

fn check_product(mut input: UmkmProductInput) -> Result<UmkmProductInput, ServiceError> {
    require("Product name", &input.name)?;
    require_non_negative("Price", input.price)?;
    input.name = input.name.trim().to_string();
    input.description = input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::SqlxUmkmRepository;
    use crate::services::media::test_support::{image, media_service};
    use crate::services::test_support;

    async fn setup() -> (UmkmService, Arc<MediaService>) {
        let pool = migrated_pool().await;
        let (media, _) = media_service(pool.clone());
        let service = UmkmService::new(SqlxUmkmRepository::boxed(pool), media.clone(), test_support::cache());
        (service, media)
    }

    fn umkm(name: &str, category: &str) -> UmkmInput {
        UmkmInput {
            name: name.to_string(),
            slug: None,
            owner_name: "Bu Sumarni".to_string(),
            category: category.to_string(),
            description: "Usaha rumahan sejak 2010".to_string(),
            address: Some("Dusun Ngasem".to_string()),
            phone: None,
            latitude: None,
            longitude: None,
            is_active: true,
        }
    }

    fn product(name: &str, price: i64, is_available: bool) -> UmkmProductInput {
        UmkmProductInput {
            name: name.to_string(),
            description: None,
            price,
            is_available,
        }
    }

    #[tokio::test]
    async fn test_create_and_public_detail() {
        let (service, _) = setup().await;
        let created = service.create(umkm("Keripik Tempe Sumarni", "Kuliner")).await.unwrap();
        assert_eq!(created.slug, "keripik-tempe-sumarni");
        assert_eq!(created.category, "kuliner");

        service.create_product(created.id, product("Keripik 250g", 15_000, true)).await.unwrap();
        service.create_product(created.id, product("Keripik 1kg", 55_000, false)).await.unwrap();

        let detail = service.get_public_detail(&created.slug).await.unwrap();
        assert_eq!(detail.umkm.id, created.id);
        assert_eq!(detail.products.len(), 1);

        assert_eq!(service.get_detail(created.id).await.unwrap().products.len(), 2);
    }

    #[tokio::test]
    async fn test_public_list_by_category() {
        let (service, _) = setup().await;
        service.create(umkm("Batik Tulis", "kerajinan")).await.unwrap();
        service.create(umkm("Wedang Uwuh", "kuliner")).await.unwrap();
        let mut closed = umkm("Warung Lama", "kuliner");
        closed.is_active = false;
        service.create(closed).await.unwrap();

        let kuliner = service.list_public(Some("kuliner"), ListParams::new(1, 10)).await.unwrap();
        assert_eq!(kuliner.total, 1);
        assert_eq!(service.list_public(None, ListParams::new(1, 10)).await.unwrap().total, 2);
        assert_eq!(service.list_admin(None, ListParams::new(1, 10)).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_validation() {
        let (service, _) = setup().await;
        let mut no_owner = umkm("Gula Aren", "kuliner");
        no_owner.owner_name = String::new();
        assert!(matches!(service.create(no_owner).await, Err(ServiceError::Validation(_))));

        let mut off_map = umkm("Gula Aren", "kuliner");
        off_map.latitude = Some(-7.5);
        off_map.longitude = Some(200.0);
        assert!(service.create(off_map).await.is_err());

        let created = service.create(umkm("Gula Aren", "kuliner")).await.unwrap();
        assert!(matches!(
            service.create_product(created.id, product("Gula 1kg", -500, true)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.create_product(999, product("Gula 1kg", 500, true)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_products_scoped_to_umkm() {
        let (service, _) = setup().await;
        let a = service.create(umkm("Batik A", "kerajinan")).await.unwrap();
        let b = service.create(umkm("Batik B", "kerajinan")).await.unwrap();
        let kain = service.create_product(a.id, product("Kain", 200_000, true)).await.unwrap();

        assert!(matches!(
            service.update_product(b.id, kain.id, product("Kain", 1, true)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.delete_product(b.id, kain.id).await.is_err());

        let updated = service.update_product(a.id, kain.id, product("Kain Batik", 210_000, true)).await.unwrap();
        assert_eq!(updated.price, 210_000);
        service.delete_product(a.id, kain.id).await.unwrap();
        assert!(service.list_products(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades_products_and_media() {
        let (service, media) = setup().await;
        let created = service.create(umkm("Anyaman Bambu", "kerajinan")).await.unwrap();
        let tampah = service.create_product(created.id, product("Tampah", 35_000, true)).await.unwrap();
        media.attach(EntityType::Umkm, created.id, &image("toko.jpg"), None).await.unwrap();
        media.attach(EntityType::UmkmProduct, tampah.id, &image("tampah.jpg"), None).await.unwrap();

        service.delete(created.id).await.unwrap();
        assert!(matches!(service.get(created.id).await, Err(ServiceError::NotFound(_))));
        assert!(media.list_for_entity(EntityType::Umkm, created.id).await.unwrap().is_empty());
        assert!(media.list_for_entity(EntityType::UmkmProduct, tampah.id).await.unwrap().is_empty());
        assert_eq!(service.count_products().await.unwrap(), 0);
    }
}
