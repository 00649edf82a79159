//! Village profile model
//!
//! Free-form key/value content (vision, mission, history, demographics...)
//! grouped into sections for the profile pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VillageProfile {
    pub id: i64,
    /// Unique key, e.g. `visi` or `jumlah_penduduk`
    #[sqlx(rename = "profile_key")]
    pub key: String,
    /// Grouping used by the public profile pages
    pub section: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of a bulk profile update.
///
/// An empty `value` removes the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub key: String,
    #[serde(default)]
    pub section: Option<String>,
    pub value: String,
}
