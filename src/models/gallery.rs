//! Gallery model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Media;

/// Photo album. Its images are `Media` rows with entity type `gallery`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Gallery {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// When the photos were taken
    pub taken_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
}

/// Gallery with its images in display order
#[derive(Debug, Clone, Serialize)]
pub struct GalleryDetail {
    #[serde(flatten)]
    pub gallery: Gallery,
    pub images: Vec<Media>,
}
