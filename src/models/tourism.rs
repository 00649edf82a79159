//! Tourism models
//!
//! - `TourismCategory` groups bookable `TourismPackage`s
//! - `TourismHouse` is a homestay listing with an optional map location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::official::default_true;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TourismCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourismCategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Bookable tourism package
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TourismPackage {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Price in rupiah
    pub price: i64,
    /// Free text, e.g. `1 hari` or `2 hari 1 malam`
    pub duration: Option<String>,
    pub facilities: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourismPackageInput {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub facilities: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Filters for package listings
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    /// Category slug
    pub category: Option<String>,
    /// Public listings only show active packages
    pub active_only: bool,
}

/// Homestay listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TourismHouse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub address: Option<String>,
    /// Price in rupiah
    pub price_per_night: i64,
    /// Guests
    pub capacity: i32,
    pub contact: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourismHouseInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub price_per_night: i64,
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_capacity() -> i32 {
    1
}
