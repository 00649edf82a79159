//! Services layer - Business logic
//!
//! Services validate input, call their repositories, keep the public cache
//! coherent and report failures as [`ServiceError`] (or a dedicated error
//! type where the domain needs more cases, e.g. authentication).
//!
//! Each content service owns a cache namespace (`news:`, `events:` ...)
//! and clears it after every write.

pub mod ai_assist;
pub mod dashboard;
pub mod event;
pub mod gallery;
pub mod html;
pub mod image_host;
pub mod media;
pub mod news;
pub mod official;
pub mod password;
pub mod potential;
pub mod profile;
pub mod rate_limiter;
pub mod settings;
pub mod slug;
pub mod tourism;
pub mod umkm;
pub mod user;

pub use ai_assist::{AiAssistService, AssistAction, AssistError, AssistRequest, AssistResponse};
pub use dashboard::{DashboardService, DashboardSummary};
pub use event::EventService;
pub use gallery::GalleryService;
pub use image_host::{create_image_host, ImageHost, LocalImageHost, RemoteImageHost, StoredImage};
pub use media::{MediaService, UploadedFile};
pub use news::NewsService;
pub use official::OfficialService;
pub use password::{hash_password, verify_password};
pub use potential::{AchievementService, PotentialService};
pub use profile::ProfileService;
pub use rate_limiter::{LoginRateLimiter, Throttle};
pub use settings::{SettingsService, SiteSettings};
pub use slug::generate_slug;
pub use tourism::TourismService;
pub use umkm::UmkmService;
pub use user::{LoginInput, SetupInput, UserService, UserServiceError};

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::cache::{Cache, CacheLayer};

/// Errors shared by the content services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The addressed record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Input rejected before touching the database
    #[error("Validation error: {0}")]
    Validation(String),

    /// A unique value (name, slug, email) is already taken
    #[error("{0}")]
    Duplicate(String),

    /// The operation conflicts with related data
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(kind: &str, ident: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} not found: {}", kind, ident))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Fail with a validation error when a required text field is blank
pub(crate) fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Fail with a validation error when an amount is negative
pub(crate) fn require_non_negative(field: &str, value: i64) -> Result<(), ServiceError> {
    if value < 0 {
        return Err(ServiceError::validation(format!("{} cannot be negative", field)));
    }
    Ok(())
}

/// Read-through cache helper.
///
/// Cache failures never fail the request; the value is loaded from the
/// database instead.
pub(crate) async fn cached<T, F, Fut>(
    cache: &Cache,
    key: &str,
    ttl: Duration,
    load: F,
) -> Result<T, ServiceError>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    match cache.get::<T>(key).await {
        Ok(Some(hit)) => return Ok(hit),
        Ok(None) => {}
        Err(e) => tracing::debug!(key, error = %e, "Ignoring unreadable cache entry"),
    }

    let value = load().await?;
    if let Err(e) = cache.set(key, &value, ttl).await {
        tracing::debug!(key, error = %e, "Failed to cache value");
    }
    Ok(value)
}

/// Clear every key under `prefix`
pub(crate) async fn invalidate(cache: &Cache, prefix: &str) {
    if let Err(e) = cache.delete_pattern(&format!("{}*", prefix)).await {
        tracing::warn!(prefix, error = %e, "Cache invalidation failed");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::cache::{create_cache, Cache};
    use crate::config::CacheConfig;

    pub fn cache() -> Arc<Cache> {
        create_cache(&CacheConfig::default()).expect("Failed to create cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cached_loads_once() {
        let cache = test_support::cache();
        let ttl = Duration::from_secs(60);

        let first: Vec<i32> = cached(&cache, "news:list", ttl, || async { Ok(vec![1, 2]) })
            .await
            .unwrap();
        let second: Vec<i32> = cached(&cache, "news:list", ttl, || async {
            Err(ServiceError::validation("should not load"))
        })
        .await
        .unwrap();
        assert_eq!(first, second);

        invalidate(&cache, "news:").await;
        let reloaded: Result<Vec<i32>, _> = cached(&cache, "news:list", ttl, || async {
            Err(ServiceError::validation("loaded again"))
        })
        .await;
        assert!(matches!(reloaded, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_require_helpers() {
        assert!(require("Judul", "  ").is_err());
        assert!(require("Judul", "Panen").is_ok());
        assert!(require_non_negative("Harga", -1).is_err());
        assert!(require_non_negative("Harga", 0).is_ok());
    }
}
