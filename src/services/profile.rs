//! Village profile service
//!
//! Key/value content for the profile pages (history, vision and mission,
//! geography, demographics...). Admins save entries in bulk; an empty value
//! removes the key.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{cached, invalidate, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::ProfileRepository;
use crate::models::{ProfileEntry, VillageProfile};

const CACHE_PREFIX: &str = "profile:";
const CACHE_KEY_ALL: &str = "profile:all";

/// Section used when an entry names none
pub const DEFAULT_SECTION: &str = "umum";

const MAX_KEY_LENGTH: usize = 100;

pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepository>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self { repo, cache, cache_ttl }
    }

    /// Every entry, ordered by section then key
    pub async fn get_all(&self) -> Result<Vec<VillageProfile>, ServiceError> {
        cached(&self.cache, CACHE_KEY_ALL, self.cache_ttl, || async {
            Ok(self.repo.list_all().await?)
        })
        .await
    }

    /// Entries grouped by section, as `section -> key -> value`
    pub async fn get_grouped(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>, ServiceError> {
        let mut grouped: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for entry in self.get_all().await? {
            grouped.entry(entry.section).or_default().insert(entry.key, entry.value);
        }
        Ok(grouped)
    }

    pub async fn get_section(&self, section: &str) -> Result<Vec<VillageProfile>, ServiceError> {
        let section = section.trim().to_lowercase();
        let key = format!("{}section:{}", CACHE_PREFIX, section);
        cached(&self.cache, &key, self.cache_ttl, || async {
            Ok(self.repo.list_section(&section).await?)
        })
        .await
    }

    pub async fn get(&self, key: &str) -> Result<VillageProfile, ServiceError> {
        self.repo
            .get(key.trim())
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile entry", key))
    }

    /// Save a batch of entries.
    ///
    /// Entries without a section keep their current one (or go to `umum`).
    /// Returns the full profile after the update.
    pub async fn upsert_many(&self, entries: Vec<ProfileEntry>) -> Result<Vec<VillageProfile>, ServiceError> {
        for entry in &entries {
            validate_key(&entry.key)?;
        }

        for entry in entries {
            let key = entry.key.trim();
            let value = entry.value.trim();
            if value.is_empty() {
                self.repo.delete(key).await?;
                continue;
            }

            let section = match entry.section.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                Some(section) => section.to_lowercase(),
                None => self
                    .repo
                    .get(key)
                    .await?
                    .map(|existing| existing.section)
                    .unwrap_or_else(|| DEFAULT_SECTION.to_string()),
            };
            self.repo.upsert(key, &section, value).await?;
        }

        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!("Village profile updated");
        self.get_all().await
    }
}

fn validate_key(key: &str) -> Result<(), ServiceError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ServiceError::validation("Profile key cannot be empty"));
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(ServiceError::validation(format!(
            "Profile key must be at most {} characters",
            MAX_KEY_LENGTH
        )));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ServiceError::validation(format!(
            "Profile key '{}' may only contain letters, digits, '_' and '-'",
            key
        )));
    }
    Ok(())
}
