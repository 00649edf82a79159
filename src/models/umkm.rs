//! UMKM models
//!
//! Small local businesses and the products they sell.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::official::default_true;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Umkm {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub owner_name: String,
    /// Free text, e.g. `kuliner` or `kerajinan`
    pub category: String,
    pub description: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UmkmInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub owner_name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Product belonging to exactly one UMKM
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UmkmProduct {
    pub id: i64,
    pub umkm_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Price in rupiah
    pub price: i64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UmkmProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

/// UMKM with its products
#[derive(Debug, Clone, Serialize)]
pub struct UmkmDetail {
    #[serde(flatten)]
    pub umkm: Umkm,
    pub products: Vec<UmkmProduct>,
}
