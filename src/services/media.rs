//! Media service
//!
//! Stores uploaded images through the configured [`ImageHost`] and keeps the
//! `media` rows that attach them to content entities. Removing stored files
//! is best effort: a failure is logged and the row is deleted anyway.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ImageHost, ServiceError, StoredImage};
use crate::config::UploadConfig;
use crate::db::repositories::MediaRepository;
use crate::models::{EntityType, ListParams, Media, NewMedia, PagedResult};

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

const MAX_CAPTION_LENGTH: usize = 500;

pub struct MediaService {
    repo: Arc<dyn MediaRepository>,
    host: Arc<dyn ImageHost>,
    upload: UploadConfig,
}

impl MediaService {
    pub fn new(repo: Arc<dyn MediaRepository>, host: Arc<dyn ImageHost>, upload: UploadConfig) -> Self {
        Self { repo, host, upload }
    }

    fn check_file(&self, file: &UploadedFile) -> Result<(), ServiceError> {
        if file.bytes.is_empty() {
            return Err(ServiceError::validation("Uploaded file is empty"));
        }
        if !self.upload.is_type_allowed(&file.mime_type) {
            return Err(ServiceError::validation(format!(
                "Invalid file type: {}. Allowed types: {}",
                file.mime_type,
                self.upload.allowed_types.join(", ")
            )));
        }
        if file.bytes.len() as u64 > self.upload.max_file_size {
            return Err(ServiceError::validation(format!(
                "File too large. Maximum size: {} MB",
                self.upload.max_file_size / 1024 / 1024
            )));
        }
        Ok(())
    }

    /// Store a file without attaching it (inline editor images)
    pub async fn upload(&self, file: &UploadedFile) -> Result<StoredImage, ServiceError> {
        self.check_file(file)?;
        let stored = self
            .host
            .store(&file.bytes, &file.file_name, &file.mime_type)
            .await?;
        tracing::info!(url = %stored.url, size = file.bytes.len(), "Stored upload");
        Ok(stored)
    }

    /// Store a file and attach it to `(entity_type, entity_id)` as the last image
    pub async fn attach(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        file: &UploadedFile,
        caption: Option<String>,
    ) -> Result<Media, ServiceError> {
        let caption = normalize_caption(caption)?;
        let stored = self.upload(file).await?;

        let row = NewMedia {
            entity_type,
            entity_id,
            url: stored.url,
            storage_key: stored.storage_key,
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.bytes.len() as i64,
            caption,
        };

        match self.repo.create(&row).await {
            Ok(media) => Ok(media),
            Err(e) => {
                self.remove_file(&row.storage_key).await;
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Media, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Media", id))
    }

    /// Media library listing, newest first
    pub async fn list(
        &self,
        entity_type: Option<EntityType>,
        params: &ListParams,
    ) -> Result<PagedResult<Media>, ServiceError> {
        Ok(self.repo.list(entity_type, params).await?)
    }

    pub async fn list_for_entity(&self, entity_type: EntityType, entity_id: i64) -> Result<Vec<Media>, ServiceError> {
        Ok(self.repo.list_for_entity(entity_type, entity_id).await?)
    }

    /// First image of each entity, for list pages
    pub async fn covers_for(
        &self,
        entity_type: EntityType,
        entity_ids: &[i64],
    ) -> Result<HashMap<i64, Media>, ServiceError> {
        let mut covers = HashMap::new();
        for media in self.repo.list_for_entities(entity_type, entity_ids).await? {
            covers.entry(media.entity_id).or_insert(media);
        }
        Ok(covers)
    }

    pub async fn update_caption(&self, id: i64, caption: Option<String>) -> Result<Media, ServiceError> {
        let caption = normalize_caption(caption)?;
        if !self.repo.update_caption(id, caption.as_deref()).await? {
            return Err(ServiceError::not_found("Media", id));
        }
        self.get(id).await
    }

    /// Put the images of one entity in the given order.
    ///
    /// `ids` must list exactly the entity's images.
    pub async fn reorder(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Media>, ServiceError> {
        let current = self.repo.list_for_entity(entity_type, entity_id).await?;

        let mut expected: Vec<i64> = current.iter().map(|m| m.id).collect();
        let mut given = ids.to_vec();
        expected.sort_unstable();
        given.sort_unstable();
        if expected != given {
            return Err(ServiceError::validation(format!(
                "Order must list each image of {} {} exactly once",
                entity_type, entity_id
            )));
        }

        for (position, id) in ids.iter().enumerate() {
            self.repo.set_sort_order(*id, position as i32).await?;
        }
        self.list_for_entity(entity_type, entity_id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let media = self.get(id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Media", id));
        }
        self.remove_file(&media.storage_key).await;
        Ok(())
    }

    /// Delete every image of an entity; called when the entity is deleted
    pub async fn delete_for_entity(&self, entity_type: EntityType, entity_id: i64) -> Result<u64, ServiceError> {
        let media = self.repo.list_for_entity(entity_type, entity_id).await?;
        if media.is_empty() {
            return Ok(0);
        }

        let deleted = self.repo.delete_for_entity(entity_type, entity_id).await?;
        join_all(media.iter().map(|item| self.remove_file(&item.storage_key))).await;
        tracing::debug!(%entity_type, entity_id, deleted, "Deleted entity media");
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }

    async fn remove_file(&self, storage_key: &str) {
        if let Err(e) = self.host.remove(storage_key).await {
            tracing::warn!(storage_key, error = %e, "Failed to remove stored file");
        }
    }
}

fn normalize_caption(caption: Option<String>) -> Result<Option<String>, ServiceError> {
    let caption = caption.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    if let Some(c) = &caption {
        if c.chars().count() > MAX_CAPTION_LENGTH {
            return Err(ServiceError::validation(format!(
                "Caption must be at most {} characters",
                MAX_CAPTION_LENGTH
            )));
        }
    }
    Ok(caption)
}
