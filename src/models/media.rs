//! Media model
//!
//! Images attach polymorphically to any content entity through
//! `(entity_type, entity_id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::InvalidValue;

/// Owner kinds a media row can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    News,
    Event,
    TourismPackage,
    TourismHouse,
    Umkm,
    UmkmProduct,
    Gallery,
    Potential,
    Achievement,
    Official,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::News,
        EntityType::Event,
        EntityType::TourismPackage,
        EntityType::TourismHouse,
        EntityType::Umkm,
        EntityType::UmkmProduct,
        EntityType::Gallery,
        EntityType::Potential,
        EntityType::Achievement,
        EntityType::Official,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::News => "news",
            EntityType::Event => "event",
            EntityType::TourismPackage => "tourism_package",
            EntityType::TourismHouse => "tourism_house",
            EntityType::Umkm => "umkm",
            EntityType::UmkmProduct => "umkm_product",
            EntityType::Gallery => "gallery",
            EntityType::Potential => "potential",
            EntityType::Achievement => "achievement",
            EntityType::Official => "official",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| InvalidValue::new("entity type", s))
    }
}

impl TryFrom<String> for EntityType {
    type Error = InvalidValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stored image attached to an entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub entity_type: EntityType,
    pub entity_id: i64,
    /// Public URL
    pub url: String,
    /// Key understood by the image host that stored the file
    pub storage_key: String,
    /// Original file name
    pub file_name: String,
    pub mime_type: String,
    /// Bytes
    pub size: i64,
    pub caption: Option<String>,
    /// Position within the owner's images; the first one is the cover
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Media row to insert after a successful upload
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub url: String,
    pub storage_key: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_parse() {
        assert_eq!("news".parse::<EntityType>().unwrap(), EntityType::News);
        assert_eq!(
            "tourism-house".parse::<EntityType>().unwrap(),
            EntityType::TourismHouse
        );
        assert_eq!("UMKM".parse::<EntityType>().unwrap(), EntityType::Umkm);
        assert!("article".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_entity_type_serde_matches_as_str() {
        for ty in EntityType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
    }
}
