//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session entity for user authentication
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let session = Session {
            id: "token".to_string(),
            user_id: 1,
            expires_at: now - Duration::minutes(1),
            created_at: now - Duration::days(7),
        };
        assert!(session.is_expired());

        let fresh = Session {
            expires_at: now + Duration::days(7),
            ..session
        };
        assert!(!fresh.is_expired());
    }
}
