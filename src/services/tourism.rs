//! Tourism service
//!
//! Three kinds of records share one cache namespace:
//! - categories group packages and cannot be deleted while packages use them
//! - packages are bookable offerings priced in rupiah
//! - houses are homestays with an optional map location

use std::sync::Arc;
use std::time::Duration;

use super::slug::resolve_slug;
use super::{cached, invalidate, require, require_non_negative, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::{
    TourismCategoryRepository, TourismHouseRepository, TourismPackageRepository,
};
use crate::models::{
    validate_coordinates, EntityType, PackageFilter, TourismCategory, TourismCategoryInput,
    TourismHouse, TourismHouseInput, TourismPackage, TourismPackageInput,
};

const CACHE_PREFIX: &str = "tourism:";

pub struct TourismService {
    category_repo: Arc<dyn TourismCategoryRepository>,
    package_repo: Arc<dyn TourismPackageRepository>,
    house_repo: Arc<dyn TourismHouseRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl TourismService {
    pub fn new(
        category_repo: Arc<dyn TourismCategoryRepository>,
        package_repo: Arc<dyn TourismPackageRepository>,
        house_repo: Arc<dyn TourismHouseRepository>,
        media: Arc<MediaService>,
        cache: Arc<Cache>,
    ) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            category_repo,
            package_repo,
            house_repo,
            media,
            cache,
            cache_ttl,
        }
    }

    // ---- categories ----

    pub async fn list_categories(&self) -> Result<Vec<TourismCategory>, ServiceError> {
        cached(&self.cache, "tourism:categories", self.cache_ttl, || async {
            Ok(self.category_repo.list().await?)
        })
        .await
    }

    pub async fn get_category(&self, id: i64) -> Result<TourismCategory, ServiceError> {
        self.category_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tourism category", id))
    }

    pub async fn create_category(&self, input: TourismCategoryInput) -> Result<TourismCategory, ServiceError> {
        let input = self.check_category(input, None).await?;
        let repo = &self.category_repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let category = self.category_repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = category.id, slug = %category.slug, "Tourism category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: TourismCategoryInput,
    ) -> Result<TourismCategory, ServiceError> {
        let existing = self.get_category(id).await?;
        let input = self.check_category(input, Some(id)).await?;
        let repo = &self.category_repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.name,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let category = self
            .category_repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tourism category", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(category)
    }

    /// Refused while any package still belongs to the category
    pub async fn delete_category(&self, id: i64) -> Result<(), ServiceError> {
        self.get_category(id).await?;
        let packages = self.category_repo.package_count(id).await?;
        if packages > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category still has {} package(s); move or delete them first",
                packages
            )));
        }

        if !self.category_repo.delete(id).await? {
            return Err(ServiceError::not_found("Tourism category", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "Tourism category deleted");
        Ok(())
    }

    async fn check_category(
        &self,
        mut input: TourismCategoryInput,
        current_id: Option<i64>,
    ) -> Result<TourismCategoryInput, ServiceError> {
        require("Category name", &input.name)?;
        input.name = input.name.trim().to_string();
        input.description = input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

        if let Some(other) = self.category_repo.get_by_name(&input.name).await? {
            if Some(other.id) != current_id {
                return Err(ServiceError::Duplicate(format!(
                    "Category '{}' already exists",
                    input.name
                )));
            }
        }
        Ok(input)
    }

    // ---- packages ----

    /// Active packages, optionally in one category (by slug)
    pub async fn list_public_packages(&self, category: Option<&str>) -> Result<Vec<TourismPackage>, ServiceError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let key = format!("tourism:packages:{}", category.unwrap_or("*"));
        let filter = PackageFilter {
            category: category.map(str::to_string),
            active_only: true,
        };
        cached(&self.cache, &key, self.cache_ttl, || async {
            Ok(self.package_repo.list(&filter).await?)
        })
        .await
    }

    pub async fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<TourismPackage>, ServiceError> {
        Ok(self.package_repo.list(filter).await?)
    }

    pub async fn get_package(&self, id: i64) -> Result<TourismPackage, ServiceError> {
        self.package_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tourism package", id))
    }

    pub async fn get_public_package(&self, slug: &str) -> Result<TourismPackage, ServiceError> {
        self.package_repo
            .get_by_slug(slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::not_found("Tourism package", slug))
    }

    pub async fn create_package(&self, input: TourismPackageInput) -> Result<TourismPackage, ServiceError> {
        let input = self.check_package(input).await?;
        let repo = &self.package_repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let package = self.package_repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = package.id, slug = %package.slug, "Tourism package created");
        Ok(package)
    }

    pub async fn update_package(&self, id: i64, input: TourismPackageInput) -> Result<TourismPackage, ServiceError> {
        let existing = self.get_package(id).await?;
        let input = self.check_package(input).await?;
        let repo = &self.package_repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.name,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let package = self
            .package_repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tourism package", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(package)
    }

    pub async fn delete_package(&self, id: i64) -> Result<(), ServiceError> {
        self.get_package(id).await?;
        self.media.delete_for_entity(EntityType::TourismPackage, id).await?;
        if !self.package_repo.delete(id).await? {
            return Err(ServiceError::not_found("Tourism package", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "Tourism package deleted");
        Ok(())
    }

    pub async fn count_packages(&self) -> Result<i64, ServiceError> {
        Ok(self.package_repo.count().await?)
    }

    async fn check_package(&self, mut input: TourismPackageInput) -> Result<TourismPackageInput, ServiceError> {
        require("Package name", &input.name)?;
        require("Description", &input.description)?;
        require_non_negative("Price", input.price)?;
        if self.category_repo.get_by_id(input.category_id).await?.is_none() {
            return Err(ServiceError::validation(format!(
                "Tourism category {} does not exist",
                input.category_id
            )));
        }
        input.name = input.name.trim().to_string();
        input.duration = input.duration.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        input.facilities = input.facilities.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
        Ok(input)
    }

    // ---- houses ----

    pub async fn list_public_houses(&self) -> Result<Vec<TourismHouse>, ServiceError> {
        cached(&self.cache, "tourism:houses", self.cache_ttl, || async {
            Ok(self.house_repo.list(true).await?)
        })
        .await
    }

    pub async fn list_houses(&self) -> Result<Vec<TourismHouse>, ServiceError> {
        Ok(self.house_repo.list(false).await?)
    }

    pub async fn get_house(&self, id: i64) -> Result<TourismHouse, ServiceError> {
        self.house_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tourism house", id))
    }

    pub async fn get_public_house(&self, slug: &str) -> Result<TourismHouse, ServiceError> {
        self.house_repo
            .get_by_slug(slug)
            .await?
            .filter(|h| h.is_active)
            .ok_or_else(|| ServiceError::not_found("Tourism house", slug))
    }

    pub async fn create_house(&self, input: TourismHouseInput) -> Result<TourismHouse, ServiceError> {
        let input = check_house(input)?;
        let repo = &self.house_repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let house = self.house_repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = house.id, slug = %house.slug, "Tourism house created");
        Ok(house)
    }

    pub async fn update_house(&self, id: i64, input: TourismHouseInput) -> Result<TourismHouse, ServiceError> {
        let existing = self.get_house(id).await?;
        let input = check_house(input)?;
        let repo = &self.house_repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.name,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let house = self
            .house_repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tourism house", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(house)
    }

    pub async fn delete_house(&self, id: i64) -> Result<(), ServiceError> {
        self.get_house(id).await?;
        self.media.delete_for_entity(EntityType::TourismHouse, id).await?;
        if !self.house_repo.delete(id).await? {
            return Err(ServiceError::not_found("Tourism house", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "Tourism house deleted");
        Ok(())
    }

    pub async fn count_houses(&self) -> Result<i64, ServiceError> {
        Ok(self.house_repo.count().await?)
    }
}

fn check_house(mut input: TourismHouseInput) -> Result<TourismHouseInput, ServiceError> {
    require("House name", &input.name)?;
    require("Description", &input.description)?;
    require_non_negative("Price per night", input.price_per_night)?;
    require_non_negative("Capacity", i64::from(input.capacity))?;
    validate_coordinates(input.latitude, input.longitude).map_err(ServiceError::Validation)?;
    input.name = input.name.trim().to_string();
    input.address = input.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    input.contact = input.contact.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{
        SqlxTourismCategoryRepository, SqlxTourismHouseRepository, SqlxTourismPackageRepository,
    };
    use crate::services::media::test_support::{image, media_service};
    use crate::services::test_support;

    async fn setup() -> (TourismService, Arc<MediaService>) {
        let pool = migrated_pool().await;
        let (media, _) = media_service(pool.clone());
        let service = TourismService::new(
            SqlxTourismCategoryRepository::boxed(pool.clone()),
            SqlxTourismPackageRepository::boxed(pool.clone()),
            SqlxTourismHouseRepository::boxed(pool),
            media.clone(),
            test_support::cache(),
        );
        (service, media)
    }

    fn category(name: &str) -> TourismCategoryInput {
        TourismCategoryInput {
            name: name.to_string(),
            slug: None,
            description: None,
        }
    }

    fn package(category_id: i64, name: &str, price: i64) -> TourismPackageInput {
        TourismPackageInput {
            category_id,
            name: name.to_string(),
            slug: None,
            description: "Jelajah desa bersama pemandu lokal".to_string(),
            price,
            duration: Some("1 hari".to_string()),
            facilities: Some("Makan siang, pemandu".to_string()),
            is_active: true,
        }
    }

    fn house(name: &str) -> TourismHouseInput {
        TourismHouseInput {
            name: name.to_string(),
            slug: None,
            description: "Rumah joglo dengan halaman luas".to_string(),
            address: Some("Dusun Krajan RT 02".to_string()),
            price_per_night: 250_000,
            capacity: 4,
            contact: Some("0812-3456-7890".to_string()),
            latitude: Some(-7.5466),
            longitude: Some(110.8271),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_category_delete_refused_while_in_use() {
        let (service, _) = setup().await;
        let edukasi = service.create_category(category("Wisata Edukasi")).await.unwrap();
        let pkg = service.create_package(package(edukasi.id, "Belajar Membatik", 75_000)).await.unwrap();

        assert!(matches!(
            service.delete_category(edukasi.id).await,
            Err(ServiceError::Conflict(_))
        ));

        service.delete_package(pkg.id).await.unwrap();
        service.delete_category(edukasi.id).await.unwrap();
        assert!(matches!(service.get_category(edukasi.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_category_name_unique() {
        let (service, _) = setup().await;
        service.create_category(category("Alam")).await.unwrap();
        assert!(matches!(
            service.create_category(category(" Alam ")).await,
            Err(ServiceError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_package_validation() {
        let (service, _) = setup().await;
        let alam = service.create_category(category("Alam")).await.unwrap();

        assert!(matches!(
            service.create_package(package(alam.id, "Tracking", -1)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.create_package(package(999, "Tracking", 10_000)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(service.create_package(package(alam.id, "Tracking", 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_public_packages_filtered() {
        let (service, _) = setup().await;
        let alam = service.create_category(category("Alam")).await.unwrap();
        let budaya = service.create_category(category("Budaya")).await.unwrap();

        service.create_package(package(alam.id, "Susur Sungai", 50_000)).await.unwrap();
        service.create_package(package(budaya.id, "Belajar Gamelan", 60_000)).await.unwrap();
        let mut inactive = package(alam.id, "Camping", 100_000);
        inactive.is_active = false;
        let camping = service.create_package(inactive).await.unwrap();

        assert_eq!(service.list_public_packages(None).await.unwrap().len(), 2);
        let alam_only = service.list_public_packages(Some("alam")).await.unwrap();
        assert_eq!(alam_only.len(), 1);
        assert_eq!(alam_only[0].slug, "susur-sungai");

        assert!(service.get_public_package(&camping.slug).await.is_err());
        assert_eq!(service.list_packages(&PackageFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_house_coordinates_validated() {
        let (service, _) = setup().await;
        let mut bad = house("Homestay Mawar");
        bad.latitude = Some(120.0);
        assert!(matches!(service.create_house(bad).await, Err(ServiceError::Validation(_))));

        let mut half = house("Homestay Mawar");
        half.longitude = None;
        assert!(service.create_house(half).await.is_err());

        let mut crowded = house("Homestay Mawar");
        crowded.capacity = -2;
        assert!(service.create_house(crowded).await.is_err());

        let created = service.create_house(house("Homestay Mawar")).await.unwrap();
        assert_eq!(created.slug, "homestay-mawar");
        assert_eq!(service.list_public_houses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_house_update_and_delete_with_media() {
        let (service, media) = setup().await;
        let created = service.create_house(house("Homestay Melati")).await.unwrap();
        media.attach(EntityType::TourismHouse, created.id, &image("kamar.jpg"), None).await.unwrap();

        let mut changed = house("Homestay Melati Asri");
        changed.latitude = None;
        changed.longitude = None;
        let updated = service.update_house(created.id, changed).await.unwrap();
        assert_eq!(updated.slug, "homestay-melati");
        assert!(updated.latitude.is_none());

        service.delete_house(created.id).await.unwrap();
        assert!(media.list_for_entity(EntityType::TourismHouse, created.id).await.unwrap().is_empty());
    }
}
