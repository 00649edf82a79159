//! Settings service
//!
//! Site-wide configuration stored as key/value rows and exposed as a typed
//! [`SiteSettings`] record. Unknown keys are kept and returned by
//! [`SettingsService::get_all_settings`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{cached, invalidate, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::SettingsRepository;

const CACHE_PREFIX: &str = "settings:";
const CACHE_KEY_SITE: &str = "settings:site";

/// Known setting keys
pub mod keys {
    pub const SITE_NAME: &str = "site_name";
    pub const SITE_TAGLINE: &str = "site_tagline";
    pub const SITE_DESCRIPTION: &str = "site_description";
    pub const LOGO_URL: &str = "logo_url";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const CONTACT_PHONE: &str = "contact_phone";
    pub const CONTACT_ADDRESS: &str = "contact_address";
    pub const WHATSAPP: &str = "whatsapp";
    pub const FACEBOOK_URL: &str = "facebook_url";
    pub const INSTAGRAM_URL: &str = "instagram_url";
    pub const YOUTUBE_URL: &str = "youtube_url";
    pub const MAPS_EMBED_URL: &str = "maps_embed_url";
    pub const NEWS_PER_PAGE: &str = "news_per_page";
}

/// Typed view over the settings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_tagline: String,
    pub site_description: String,
    pub logo_url: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub whatsapp: String,
    pub facebook_url: String,
    pub instagram_url: String,
    pub youtube_url: String,
    pub maps_embed_url: String,
    /// Page size of the public news list
    pub news_per_page: u32,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Desa Banyuanyar".to_string(),
            site_tagline: String::new(),
            site_description: String::new(),
            logo_url: String::new(),
            contact_email: String::new(),
            contact_phone: String::new(),
            contact_address: String::new(),
            whatsapp: String::new(),
            facebook_url: String::new(),
            instagram_url: String::new(),
            youtube_url: String::new(),
            maps_embed_url: String::new(),
            news_per_page: 9,
        }
    }
}

impl SiteSettings {
    fn from_map(map: &HashMap<String, String>) -> Self {
        let d = Self::default();
        let text = |key: &str, default: String| map.get(key).cloned().unwrap_or(default);
        Self {
            site_name: text(keys::SITE_NAME, d.site_name),
            site_tagline: text(keys::SITE_TAGLINE, d.site_tagline),
            site_description: text(keys::SITE_DESCRIPTION, d.site_description),
            logo_url: text(keys::LOGO_URL, d.logo_url),
            contact_email: text(keys::CONTACT_EMAIL, d.contact_email),
            contact_phone: text(keys::CONTACT_PHONE, d.contact_phone),
            contact_address: text(keys::CONTACT_ADDRESS, d.contact_address),
            whatsapp: text(keys::WHATSAPP, d.whatsapp),
            facebook_url: text(keys::FACEBOOK_URL, d.facebook_url),
            instagram_url: text(keys::INSTAGRAM_URL, d.instagram_url),
            youtube_url: text(keys::YOUTUBE_URL, d.youtube_url),
            maps_embed_url: text(keys::MAPS_EMBED_URL, d.maps_embed_url),
            news_per_page: map
                .get(keys::NEWS_PER_PAGE)
                .and_then(|v| v.trim().parse().ok())
                .filter(|n| (1..=50).contains(n))
                .unwrap_or(d.news_per_page),
        }
    }

    fn to_map(&self) -> HashMap<String, String> {
        [
            (keys::SITE_NAME, self.site_name.clone()),
            (keys::SITE_TAGLINE, self.site_tagline.clone()),
            (keys::SITE_DESCRIPTION, self.site_description.clone()),
            (keys::LOGO_URL, self.logo_url.clone()),
            (keys::CONTACT_EMAIL, self.contact_email.clone()),
            (keys::CONTACT_PHONE, self.contact_phone.clone()),
            (keys::CONTACT_ADDRESS, self.contact_address.clone()),
            (keys::WHATSAPP, self.whatsapp.clone()),
            (keys::FACEBOOK_URL, self.facebook_url.clone()),
            (keys::INSTAGRAM_URL, self.instagram_url.clone()),
            (keys::YOUTUBE_URL, self.youtube_url.clone()),
            (keys::MAPS_EMBED_URL, self.maps_embed_url.clone()),
            (keys::NEWS_PER_PAGE, self.news_per_page.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.trim().to_string()))
        .collect()
    }

    fn validate(&self) -> Result<(), ServiceError> {
        super::require("Site name", &self.site_name)?;
        if !(1..=50).contains(&self.news_per_page) {
            return Err(ServiceError::validation("News per page must be between 1 and 50"));
        }
        Ok(())
    }
}

/// Settings service for managing site configuration
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self { repo, cache, cache_ttl }
    }

    /// Typed settings with defaults for missing keys
    pub async fn get_site_settings(&self) -> Result<SiteSettings, ServiceError> {
        cached(&self.cache, CACHE_KEY_SITE, self.cache_ttl, || async {
            let map = self.get_all_settings().await?;
            Ok(SiteSettings::from_map(&map))
        })
        .await
    }

    /// Replace every known setting
    pub async fn update_site_settings(&self, settings: &SiteSettings) -> Result<SiteSettings, ServiceError> {
        settings.validate()?;
        self.repo.set_many(&settings.to_map()).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        self.get_site_settings().await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.repo.get(key).await?.map(|s| s.value))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        super::require("Setting key", key)?;
        self.repo.set(key, value).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(())
    }

    /// Raw key/value view, including keys the typed record does not know
    pub async fn get_all_settings(&self) -> Result<HashMap<String, String>, ServiceError> {
        let settings = self.repo.get_all().await?;
        Ok(settings.into_iter().map(|s| (s.key, s.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::SqlxSettingsRepository;
    use crate::services::test_support;

    async fn setup_test_service() -> SettingsService {
        let pool = migrated_pool().await;
        SettingsService::new(SqlxSettingsRepository::boxed(pool), test_support::cache())
    }

    #[tokio::test]
    async fn test_seeded_defaults() {
        let service = setup_test_service().await;
        let settings = service.get_site_settings().await.unwrap();
        assert_eq!(settings.site_name, "Desa Banyuanyar");
        assert_eq!(settings.news_per_page, 9);
        assert_eq!(settings.contact_email, "");
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let service = setup_test_service().await;
        let mut settings = service.get_site_settings().await.unwrap();
        settings.contact_phone = "0812-0000-1111".to_string();
        settings.news_per_page = 12;

        let updated = service.update_site_settings(&settings).await.unwrap();
        assert_eq!(updated.contact_phone, "0812-0000-1111");
        assert_eq!(service.get_site_settings().await.unwrap().news_per_page, 12);
    }

    #[tokio::test]
    async fn test_update_validation() {
        let service = setup_test_service().await;
        let invalid = SiteSettings {
            news_per_page: 0,
            ..Default::default()
        };
        assert!(matches!(
            service.update_site_settings(&invalid).await,
            Err(ServiceError::Validation(_))
        ));

        let nameless = SiteSettings {
            site_name: " ".to_string(),
            ..Default::default()
        };
        assert!(service.update_site_settings(&nameless).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_keys_survive() {
        let service = setup_test_service().await;
        service.set("hero_image", "/uploads/hero.jpg").await.unwrap();
        let all = service.get_all_settings().await.unwrap();
        assert_eq!(all.get("hero_image").map(String::as_str), Some("/uploads/hero.jpg"));
        assert_eq!(service.get("hero_image").await.unwrap().as_deref(), Some("/uploads/hero.jpg"));
    }

    #[test]
    fn test_out_of_range_page_size_falls_back() {
        let mut map = HashMap::new();
        map.insert(keys::NEWS_PER_PAGE.to_string(), "500".to_string());
        assert_eq!(SiteSettings::from_map(&map).news_per_page, 9);
    }
}
