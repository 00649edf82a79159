//! News model
//!
//! This module provides:
//! - `News` entity and its `NewsStatus` publication state
//! - `NewsCategory` entity
//! - Input and filter types used by the news service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::InvalidValue;

/// News category
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsCategoryInput {
    pub name: String,
    /// Generated from the name when omitted
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// News article
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct News {
    pub id: i64,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub title: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Rich-text HTML from the editor
    pub content: String,
    /// Plain-text summary derived from `content`
    pub excerpt: String,
    #[sqlx(try_from = "String")]
    pub status: NewsStatus,
    /// Set the first time the article is published
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl News {
    pub fn is_published(&self) -> bool {
        self.status == NewsStatus::Published
    }
}

/// Publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    /// Not visible to the public
    #[default]
    Draft,
    Published,
    /// Hidden but kept
    Archived,
}

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsStatus::Draft => "draft",
            NewsStatus::Published => "published",
            NewsStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for NewsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(NewsStatus::Draft),
            "published" => Ok(NewsStatus::Published),
            "archived" => Ok(NewsStatus::Archived),
            _ => Err(InvalidValue::new("news status", s)),
        }
    }
}

impl TryFrom<String> for NewsStatus {
    type Error = InvalidValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Create/update payload for news.
///
/// Updates replace every field. `excerpt` is derived from `content` when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: NewsStatus,
}

/// Filters for news listings
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    /// Only this status (public listings force `Published`)
    pub status: Option<NewsStatus>,
    /// Category slug
    pub category: Option<String>,
    /// Case-insensitive match on title or excerpt
    pub search: Option<String>,
}

impl NewsFilter {
    pub fn published() -> Self {
        Self {
            status: Some(NewsStatus::Published),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_status_roundtrip_str() {
        for status in [NewsStatus::Draft, NewsStatus::Published, NewsStatus::Archived] {
            assert_eq!(status.as_str().parse::<NewsStatus>().unwrap(), status);
        }
        assert!("pending".parse::<NewsStatus>().is_err());
    }

    #[test]
    fn test_news_input_defaults() {
        let input: NewsInput =
            serde_json::from_str(r#"{"title":"Panen Raya","content":"<p>Hasil panen</p>"}"#).unwrap();
        assert_eq!(input.status, NewsStatus::Draft);
        assert!(input.slug.is_none());
        assert!(input.category_id.is_none());
    }
}
