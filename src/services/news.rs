//! News service
//!
//! News articles and their categories. Public listings only ever see
//! published articles; `published_at` is stamped the first time an article
//! is published and kept afterwards.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::html::{make_excerpt, strip_tags, EXCERPT_LENGTH};
use super::slug::resolve_slug;
use super::{cached, invalidate, require, MediaService, ServiceError};
use crate::cache::Cache;
use crate::db::repositories::{NewsCategoryRepository, NewsRepository};
use crate::models::{
    EntityType, ListParams, News, NewsCategory, NewsCategoryInput, NewsFilter, NewsInput,
    NewsStatus, PagedResult,
};

const CACHE_PREFIX: &str = "news:";

pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    category_repo: Arc<dyn NewsCategoryRepository>,
    media: Arc<MediaService>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl NewsService {
    pub fn new(
        news_repo: Arc<dyn NewsRepository>,
        category_repo: Arc<dyn NewsCategoryRepository>,
        media: Arc<MediaService>,
        cache: Arc<Cache>,
    ) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            news_repo,
            category_repo,
            media,
            cache,
            cache_ttl,
        }
    }

    // ---- categories ----

    pub async fn list_categories(&self) -> Result<Vec<NewsCategory>, ServiceError> {
        cached(&self.cache, "news:categories", self.cache_ttl, || async {
            Ok(self.category_repo.list().await?)
        })
        .await
    }

    pub async fn get_category(&self, id: i64) -> Result<NewsCategory, ServiceError> {
        self.category_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("News category", id))
    }

    pub async fn create_category(&self, input: NewsCategoryInput) -> Result<NewsCategory, ServiceError> {
        let input = self.check_category(input, None).await?;
        let repo = &self.category_repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let category = self.category_repo.create(&input, &slug).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = category.id, slug = %category.slug, "News category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, input: NewsCategoryInput) -> Result<NewsCategory, ServiceError> {
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
            .ok_or_else(|| ServiceError::not_found("News category", id))?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(category)
    }

    /// Delete a category; its articles become uncategorized
    pub async fn delete_category(&self, id: i64) -> Result<(), ServiceError> {
        if !self.category_repo.delete(id).await? {
            return Err(ServiceError::not_found("News category", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "News category deleted");
        Ok(())
    }

    async fn check_category(
        &self,
        mut input: NewsCategoryInput,
        current_id: Option<i64>,
    ) -> Result<NewsCategoryInput, ServiceError> {
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

    // ---- news ----

    /// Published articles, newest first
    pub async fn list_public(
        &self,
        category: Option<&str>,
        search: Option<&str>,
        params: ListParams,
    ) -> Result<PagedResult<News>, ServiceError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let filter = NewsFilter {
            category: category.map(str::to_string),
            search: search.map(str::to_string),
            ..NewsFilter::published()
        };

        let key = format!(
            "news:list:{}:{}:{}:{}",
            category.unwrap_or(""),
            search.map(str::to_lowercase).unwrap_or_default(),
            params.page,
            params.per_page
        );
        cached(&self.cache, &key, self.cache_ttl, || async {
            Ok(self.news_repo.list(&filter, &params).await?)
        })
        .await
    }

    /// Admin listing over every status
    pub async fn list_admin(&self, filter: &NewsFilter, params: ListParams) -> Result<PagedResult<News>, ServiceError> {
        Ok(self.news_repo.list(filter, &params).await?)
    }

    /// Most recent published articles, for the home page
    pub async fn latest(&self, limit: u32) -> Result<Vec<News>, ServiceError> {
        Ok(self.list_public(None, None, ListParams::new(1, limit)).await?.items)
    }

    /// Published article by slug. Counts a view.
    pub async fn get_public_by_slug(&self, slug: &str) -> Result<News, ServiceError> {
        let mut news = self
            .news_repo
            .get_by_slug(slug)
            .await?
            .filter(News::is_published)
            .ok_or_else(|| ServiceError::not_found("News", slug))?;

        self.news_repo.increment_view(news.id).await?;
        news.view_count += 1;
        Ok(news)
    }

    pub async fn get(&self, id: i64) -> Result<News, ServiceError> {
        self.news_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("News", id))
    }

    pub async fn create(&self, input: NewsInput, author_id: Option<i64>) -> Result<News, ServiceError> {
        let input = self.check_news(input).await?;
        let repo = &self.news_repo;
        let slug = resolve_slug(input.slug.as_deref(), &input.title, None, |s| async move {
            repo.slug_exists(&s, None).await
        })
        .await?;

        let now = Utc::now();
        let draft = News {
            id: 0,
            category_id: input.category_id,
            author_id,
            title: input.title,
            slug,
            excerpt: excerpt_for(input.excerpt.as_deref(), &input.content),
            content: input.content,
            status: input.status,
            published_at: (input.status == NewsStatus::Published).then_some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        let news = self.news_repo.create(&draft).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id = news.id, slug = %news.slug, status = %news.status, "News created");
        Ok(news)
    }

    /// Replace an article. An omitted slug keeps the current one.
    pub async fn update(&self, id: i64, input: NewsInput) -> Result<News, ServiceError> {
        let existing = self.get(id).await?;
        let input = self.check_news(input).await?;
        let repo = &self.news_repo;
        let slug = resolve_slug(
            input.slug.as_deref(),
            &input.title,
            Some(&existing.slug),
            |s| async move { repo.slug_exists(&s, Some(id)).await },
        )
        .await?;

        let published_at = match (input.status, existing.published_at) {
            (_, Some(at)) => Some(at),
            (NewsStatus::Published, None) => Some(Utc::now()),
            (_, None) => None,
        };

        let news = News {
            category_id: input.category_id,
            title: input.title,
            slug,
            excerpt: excerpt_for(input.excerpt.as_deref(), &input.content),
            content: input.content,
            status: input.status,
            published_at,
            ..existing
        };

        let news = self.news_repo.update(&news).await?;
        invalidate(&self.cache, CACHE_PREFIX).await;
        Ok(news)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.media.delete_for_entity(EntityType::News, id).await?;
        if !self.news_repo.delete(id).await? {
            return Err(ServiceError::not_found("News", id));
        }
        invalidate(&self.cache, CACHE_PREFIX).await;
        tracing::info!(id, "News deleted");
        Ok(())
    }

    pub async fn count_by_status(&self, status: NewsStatus) -> Result<i64, ServiceError> {
        Ok(self.news_repo.count_by_status(status).await?)
    }

    async fn check_news(&self, mut input: NewsInput) -> Result<NewsInput, ServiceError> {
        require("Title", &input.title)?;
        if strip_tags(&input.content).is_empty() {
            return Err(ServiceError::validation("Content cannot be empty"));
        }
        input.title = input.title.trim().to_string();

        if let Some(category_id) = input.category_id {
            if self.category_repo.get_by_id(category_id).await?.is_none() {
                return Err(ServiceError::validation(format!(
                    "News category {} does not exist",
                    category_id
                )));
            }
        }
        Ok(input)
    }
}

/// Explicit excerpt (tags removed) or one derived from the content
fn excerpt_for(explicit: Option<&str>, content: &str) -> String {
    match explicit.map(strip_tags).filter(|e| !e.is_empty()) {
        Some(excerpt) => excerpt,
        None => make_excerpt(content, EXCERPT_LENGTH),
    }
}
