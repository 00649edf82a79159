//! Government official model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member of the village government (kepala desa, sekretaris, kaur, kasi...)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GovernmentOfficial {
    pub id: i64,
    pub name: String,
    pub position: String,
    /// Photo URL
    pub photo: Option<String>,
    /// Term of office, e.g. `2019-2025`
    pub period: Option<String>,
    /// Display order (ascending)
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficialInput {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub(crate) fn default_true() -> bool {
    true
}
