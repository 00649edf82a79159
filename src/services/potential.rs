//! Village potentials and achievements

use chrono::{Datelike, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::slug::resolve_slug;
use super::{cached, invalidate, require, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::{AchievementRepository, PotentialRepository};
use crate::models::{Achievement, AchievementInput, EntityType, PotentialInput, VillagePotential};

/// Accepted achievement levels, smallest first
pub const ACHIEVEMENT_LEVELS: [&str; 5] = ["desa", "kecamatan", "kabupaten", "provinsi", "nasional"];

const EARLIEST_YEAR: i32 = 1900;

pub struct PotentialService {
    repo: Arc<dyn PotentialRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl PotentialService {
    const CACHE_PREFIX: &'static str = "potentials:";

    pub fn new(repo: Arc<dyn PotentialRepository>, media: Arc<MediaService>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            media,
            cache,
            cache_ttl,
        }
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<VillagePotential>, ServiceError> {
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        let key = format!("potentials:list:{}", category.as_deref().unwrap_or("*"));
        cached(&self.cache, &key, self.cache_ttl, || async {
            Ok(self.repo.list(category.as_deref()).await?)
        })
        .await
    }

    pub async fn get(&self, id: i64) -> Result<VillagePotential, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Potential", id))
    }

    pub async fn create(&self, input: PotentialInput) -> Result<VillagePotential, ServiceError> {
        let input = normalize_potential(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.title, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let potential = self.repo.create(&input, &slug).await?;
        invalidate(&self.cache, Self::CACHE_PREFIX).await;
        tracing::info!(id = potential.id, slug = %potential.slug, "Potential created");
        Ok(potential)
    }

    pub async fn update(&self, id: i64, input: PotentialInput) -> Result<VillagePotential, ServiceError> {
        let existing = self.get(id).await?;
        let input = normalize_potential(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.title,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let potential = self
            .repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Potential", id))?;
        invalidate(&self.cache, Self::CACHE_PREFIX).await;
        Ok(potential)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.media.delete_for_entity(EntityType::Potential, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Potential", id));
        }
        invalidate(&self.cache, Self::CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }
}

fn normalize_potential(mut input: PotentialInput) -> Result<PotentialInput, ServiceError> {
    require("Title", &input.title)?;
    require("Category", &input.category)?;
    require("Description", &input.description)?;
    input.title = input.title.trim().to_string();
    input.category = input.category.trim().to_lowercase();
    Ok(input)
}

pub struct AchievementService {
    repo: Arc<dyn AchievementRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl AchievementService {
    const CACHE_PREFIX: &'static str = "achievements:";

    pub fn new(repo: Arc<dyn AchievementRepository>, media: Arc<MediaService>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            media,
            cache,
            cache_ttl,
        }
    }

    /// Newest year first
    pub async fn list(&self) -> Result<Vec<Achievement>, ServiceError> {
        cached(&self.cache, "achievements:list", self.cache_ttl, || async {
            Ok(self.repo.list().await?)
        })
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Achievement, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Achievement", id))
    }

    pub async fn create(&self, input: AchievementInput) -> Result<Achievement, ServiceError> {
        let input = normalize_achievement(input)?;
        let achievement = self.repo.create(&input).await?;
        invalidate(&self.cache, Self::CACHE_PREFIX).await;
        tracing::info!(id = achievement.id, year = achievement.year, "Achievement created");
        Ok(achievement)
    }

    pub async fn update(&self, id: i64, input: AchievementInput) -> Result<Achievement, ServiceError> {
        let input = normalize_achievement(input)?;
        let achievement = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Achievement", id))?;
        invalidate(&self.cache, Self::CACHE_PREFIX).await;
        Ok(achievement)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.media.delete_for_entity(EntityType::Achievement, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Achievement", id));
        }
        invalidate(&self.cache, Self::CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }
}

fn normalize_achievement(mut input: AchievementInput) -> Result<AchievementInput, ServiceError> {
    require("Title", &input.title)?;

    let latest = Utc::now().year() + 1;
    if !(EARLIEST_YEAR..=latest).contains(&input.year) {
        return Err(ServiceError::validation(format!(
            "Year must be between {} and {}",
            EARLIEST_YEAR, latest
        )));
    }

    let level = input.level.trim().to_lowercase();
    if !ACHIEVEMENT_LEVELS.contains(&level.as_str()) {
        return Err(ServiceError::validation(format!(
            "Level must be one of: {}",
            ACHIEVEMENT_LEVELS.join(", ")
        )));
    }

    input.title = input.title.trim().to_string();
    input.level = level;
    input.description = input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    Ok(input)
}
