//! User repository
//!
//! Database operations for back-office accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user (name, email, password hash and role)
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// Count users holding `role`
    async fn count_by_role(&self, role: UserRole) -> Result<i64>;

    /// List all users ordered by name
    async fn list(&self) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create user")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        Ok(User {
            id,
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get user by ID")
        })
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER(?)", USER_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(db)
                .await
                .context("Failed to get user by email")
        })
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE users
                SET name = ?, email = ?, password_hash = ?, role = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(now)
            .bind(user.id)
            .execute(db)
            .await
            .context("Failed to update user")?;
            Ok::<_, anyhow::Error>(())
        })?;

        Ok(User {
            updated_at: now,
            ..user.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        on_pool!(self.pool, |db| {
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete user")?;
            Ok(())
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "users").await
    }

    async fn count_by_role(&self, role: UserRole) -> Result<i64> {
        on_pool!(self.pool, |db| {
            let row = sqlx::query("SELECT COUNT(*) AS count FROM users WHERE role = ?")
                .bind(role.as_str())
                .fetch_one(db)
                .await
                .context("Failed to count users by role")?;
            Ok(row.get::<i64, _>("count"))
        })
    }

    async fn list(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY name, id", USER_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, User>(&sql)
                .fetch_all(db)
                .await
                .context("Failed to list users")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    async fn setup_test_repo() -> SqlxUserRepository {
        SqlxUserRepository::new(migrated_pool().await)
    }

    fn test_user(name: &str, email: &str, role: UserRole) -> User {
        User::new(name.to_string(), email.to_string(), "hash".to_string(), role)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&test_user("Kepala Desa", "kades@banyuanyar.desa.id", UserRole::Admin))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.name, "Kepala Desa");
        assert_eq!(found.role, UserRole::Admin);
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_get_by_email_is_case_insensitive() {
        let repo = setup_test_repo().await;
        repo.create(&test_user("Operator", "operator@banyuanyar.desa.id", UserRole::Editor))
            .await
            .unwrap();

        let found = repo.get_by_email("OPERATOR@banyuanyar.desa.id").await.unwrap();
        assert!(found.is_some());
        assert!(repo.get_by_email("nobody@desa.id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let repo = setup_test_repo().await;
        repo.create(&test_user("A", "dup@desa.id", UserRole::Editor)).await.unwrap();
        let result = repo.create(&test_user("B", "dup@desa.id", UserRole::Editor)).await;
        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let repo = setup_test_repo().await;
        let mut user = repo
            .create(&test_user("Kaur", "kaur@desa.id", UserRole::Editor))
            .await
            .unwrap();

        user.name = "Kaur Keuangan".to_string();
        user.role = UserRole::Admin;
        repo.update(&user).await.unwrap();

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Kaur Keuangan");
        assert_eq!(found.role, UserRole::Admin);

        repo.delete(user.id).await.unwrap();
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts_and_list() {
        let repo = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create(&test_user("Budi", "budi@desa.id", UserRole::Admin)).await.unwrap();
        repo.create(&test_user("Ani", "ani@desa.id", UserRole::Editor)).await.unwrap();
        repo.create(&test_user("Citra", "citra@desa.id", UserRole::Editor)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.count_by_role(UserRole::Admin).await.unwrap(), 1);
        assert_eq!(repo.count_by_role(UserRole::Editor).await.unwrap(), 2);

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Ani", "Budi", "Citra"]);
    }
}
