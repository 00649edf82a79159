//! Event (agenda) service

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::slug::resolve_slug;
use super::{cached, invalidate, require, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::EventRepository;
use crate::models::{EntityType, Event, EventInput, EventPhase};

const CACHE_PREFIX: &str = "events:";
const CACHE_KEY_PUBLISHED: &str = "events:published";

pub struct EventService {
    repo: Arc<dyn EventRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, media: Arc<MediaService>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            media,
            cache,
            cache_ttl,
        }
    }

    /// Published events, optionally narrowed to one phase.
    ///
    /// Upcoming events come soonest first; other phases most recent first.
    pub async fn list_public(&self, phase: Option<EventPhase>) -> Result<Vec<Event>, ServiceError> {
        let events: Vec<Event> = cached(&self.cache, CACHE_KEY_PUBLISHED, self.cache_ttl, || async {
            Ok(self.repo.list(true).await?)
        })
        .await?;

        Ok(filter_by_phase(events, phase, Utc::now()))
    }

    pub async fn list_all(&self) -> Result<Vec<Event>, ServiceError> {
        Ok(self.repo.list(false).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Event, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event", id))
    }

    /// Published event by slug
    pub async fn get_public_by_slug(&self, slug: &str) -> Result<Event, ServiceError> {
        self.repo
            .get_by_slug(slug)
            .await?
            .filter(|e| e.is_published)
            .ok_or_else(|| ServiceError::not_found("Event", slug))
    }

    pub async fn create(&self, input: EventInput) -> Result<Event, ServiceError> {
        let input = normalize(input)?;
        let repo = &self.repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.title, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let event = self.repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = event.id, slug = %event.slug, "Event created");
        Ok(event)
    }

    pub async fn update(&self, id: i64, input: EventInput) -> Result<Event, ServiceError> {
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

        let event = self
            .repo
            .update(id, &input, &slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(event)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.media.delete_for_entity(EntityType::Event, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Event", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "Event deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }
}

fn normalize(mut input: EventInput) -> Result<EventInput, ServiceError> {
    require("Title", &input.title)?;
    require("Description", &input.description)?;
    if let Some(end) = input.end_at {
        if end < input.start_at {
            return Err(ServiceError::validation("Event cannot end before it starts"));
        }
    }
    input.title = input.title.trim().to_string();
    input.location = input.location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
    Ok(input)
}

fn filter_by_phase(events: Vec<Event>, phase: Option<EventPhase>, now: DateTime<Utc>) -> Vec<Event> {
    let Some(phase) = phase else {
        return events;
    };

    let mut selected: Vec<Event> = events.into_iter().filter(|e| e.phase_at(now) == phase).collect();
    match phase {
        EventPhase::Upcoming => selected.sort_by_key(|e| e.start_at),
        EventPhase::Ongoing | EventPhase::Finished => {
            selected.sort_by(|a, b| b.start_at.cmp(&a.start_at))
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::SqlxEventRepository;
    use crate::services::media::test_support::media_service;
    use crate::services::test_support;
    use chrono::Duration as ChronoDuration;

    async fn setup_test_service() -> EventService {
        let pool = migrated_pool().await;
        let (media, _) = media_service(pool.clone());
        EventService::new(SqlxEventRepository::boxed(pool), media, test_support::cache())
    }

    fn input(title: &str, start_at: DateTime<Utc>, end_at: Option<DateTime<Utc>>) -> EventInput {
        EventInput {
            title: title.to_string(),
            slug: None,
            description: "Acara warga".to_string(),
            location: Some("Balai Desa".to_string()),
            start_at,
            end_at,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let service = setup_test_service().await;
        let start = Utc::now();
        let result = service
            .create(input("Musyawarah", start, Some(start - ChronoDuration::hours(1))))
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_public_phase_filter() {
        let service = setup_test_service().await;
        let now = Utc::now();
        service
            .create(input("Bersih Desa", now - ChronoDuration::days(10), Some(now - ChronoDuration::days(9))))
            .await
            .unwrap();
        service
            .create(input("Pasar Rakyat", now - ChronoDuration::hours(1), Some(now + ChronoDuration::hours(3))))
            .await
            .unwrap();
        service
            .create(input("Lomba 17an", now + ChronoDuration::days(20), None))
            .await
            .unwrap();
        service
            .create(input("Pentas Seni", now + ChronoDuration::days(5), None))
            .await
            .unwrap();

        let mut hidden = input("Rapat Tertutup", now + ChronoDuration::days(1), None);
        hidden.is_published = false;
        service.create(hidden).await.unwrap();

        assert_eq!(service.list_public(None).await.unwrap().len(), 4);

        let upcoming = service.list_public(Some(EventPhase::Upcoming)).await.unwrap();
        let titles: Vec<_> = upcoming.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Pentas Seni", "Lomba 17an"]);

        let ongoing = service.list_public(Some(EventPhase::Ongoing)).await.unwrap();
        assert_eq!(ongoing[0].title, "Pasar Rakyat");

        let finished = service.list_public(Some(EventPhase::Finished)).await.unwrap();
        assert_eq!(finished[0].slug, "bersih-desa");
    }

    #[tokio::test]
    async fn test_unpublished_hidden_by_slug() {
        let service = setup_test_service().await;
        let mut draft = input("Rapat RT", Utc::now(), None);
        draft.is_published = false;
        let event = service.create(draft).await.unwrap();

        assert!(matches!(
            service.get_public_by_slug(&event.slug).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(service.get(event.id).await.unwrap().title, "Rapat RT");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = setup_test_service().await;
        let start = Utc::now() + ChronoDuration::days(3);
        let event = service.create(input("Kirab Budaya", start, None)).await.unwrap();

        let mut changed = input("Kirab Budaya Desa", start, Some(start + ChronoDuration::hours(4)));
        changed.slug = Some("kirab-2024".to_string());
        let updated = service.update(event.id, changed).await.unwrap();
        assert_eq!(updated.slug, "kirab-2024");
        assert!(updated.end_at.is_some());

        service.delete(event.id).await.unwrap();
        assert!(matches!(service.delete(event.id).await, Err(ServiceError::NotFound(_))));
    }
}
