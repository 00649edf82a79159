//! Village potentials and achievements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Economic or natural potential of the village (agriculture, crafts, nature...)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VillagePotential {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub category: String,
    pub description: String,
}

/// Award or recognition received by the village
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    /// `desa`, `kecamatan`, `kabupaten`, `provinsi` or `nasional`
    pub level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub year: i32,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "desa".to_string()
}
