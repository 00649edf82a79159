//! Session repository
//!
//! Database operations for login sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::db::{on_pool, DynDatabasePool};
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                INSERT INTO sessions (id, user_id, expires_at, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .bind(session.created_at)
            .execute(db)
            .await
            .context("Failed to create session")?;
            Ok(session.clone())
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Session>(
                "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to get session")
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete session")?;
            Ok(())
        })
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                .bind(user_id)
                .execute(db)
                .await
                .context("Failed to delete user sessions")?;
            Ok(())
        })
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Utc::now();
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(db)
                .await
                .context("Failed to delete expired sessions")?;
            Ok(result.rows_affected())
        })
    }
}
