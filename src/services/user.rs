//! User service
//!
//! Back-office accounts and sessions:
//! - first-run setup (only while no account exists) and config bootstrap
//! - login/logout with opaque session tokens
//! - account management by admins, guarding the last admin
//! - password changes

use crate::config::BootstrapAdmin;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, UpdateUserInput, User, UserRole};
use crate::services::password::{check_password_policy, hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    /// Setup after the first account, or removing the last admin
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Credentials posted to `/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// First admin account posted to `/auth/setup`
#[derive(Debug, Clone, Deserialize)]
pub struct SetupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: session_expiration_days.max(1),
        }
    }

    pub fn session_expiration_days(&self) -> i64 {
        self.session_expiration_days
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Whether any account exists (drives the setup screen)
    pub async fn has_users(&self) -> Result<bool, UserServiceError> {
        let count = self.user_repo.count().await.context("Failed to count users")?;
        Ok(count > 0)
    }

    /// Create the first admin account.
    ///
    /// Refused with `Conflict` once any account exists.
    pub async fn setup_first_admin(&self, input: SetupInput) -> Result<User, UserServiceError> {
        if self.has_users().await? {
            return Err(UserServiceError::Conflict(
                "Setup has already been completed".to_string(),
            ));
        }

        let user = self
            .insert_user(&input.name, &input.email, &input.password, UserRole::Admin)
            .await?;
        tracing::info!(user_id = user.id, email = %user.email, "First admin account created");
        Ok(user)
    }

    /// Create the configured admin when the users table is empty.
    ///
    /// Returns `None` when accounts already exist.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<Option<User>, UserServiceError> {
        if self.has_users().await? {
            return Ok(None);
        }
        let user = self
            .insert_user(&admin.name, &admin.email, &admin.password, UserRole::Admin)
            .await?;
        tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin account created");
        Ok(Some(user))
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Check credentials and open a session
    pub async fn login(&self, input: LoginInput) -> Result<(Session, User), UserServiceError> {
        let invalid = || UserServiceError::AuthenticationError("Invalid email or password".to_string());

        let user = self
            .user_repo
            .get_by_email(input.email.trim())
            .await
            .context("Failed to get user by email")?
            .ok_or_else(invalid)?;

        let password_valid =
            verify_password(&input.password, &user.password_hash).context("Failed to verify password")?;
        if !password_valid {
            return Err(invalid());
        }

        let session = self.create_session(user.id).await?;
        Ok((session, user))
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// User behind a session token, or `None` when missing or expired.
    ///
    /// Expired sessions are deleted on sight.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!(error = %e, "Failed to delete expired session");
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Delete all expired sessions; returns how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    // ========================================================================
    // Account management
    // ========================================================================

    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list().await.context("Failed to list users")?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let role = input.role.unwrap_or_default();
        let user = self
            .insert_user(&input.name, &input.email, &input.password, role)
            .await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Apply the provided fields.
    ///
    /// Demoting the last admin is refused.
    pub async fn update_user(&self, id: i64, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let mut user = self.get_by_id(id).await?.ok_or(UserServiceError::NotFound(id))?;

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(UserServiceError::ValidationError("Name cannot be empty".to_string()));
            }
            user.name = name.trim().to_string();
        }

        if let Some(email) = input.email {
            let email = normalize_email(&email)?;
            if email != user.email.to_lowercase() {
                if let Some(other) = self
                    .user_repo
                    .get_by_email(&email)
                    .await
                    .context("Failed to check email")?
                {
                    if other.id != id {
                        return Err(UserServiceError::UserExists(format!(
                            "Email '{}' is already registered",
                            email
                        )));
                    }
                }
            }
            user.email = email;
        }

        if let Some(password) = input.password {
            check_password_policy(&password).map_err(UserServiceError::ValidationError)?;
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }

        if let Some(role) = input.role {
            if user.role == UserRole::Admin && role != UserRole::Admin {
                self.ensure_not_last_admin("demote").await?;
            }
            user.role = role;
        }

        Ok(self.user_repo.update(&user).await.context("Failed to update user")?)
    }

    /// Delete an account and its sessions.
    ///
    /// `acting_user_id` cannot delete itself, and the last admin stays.
    pub async fn delete_user(&self, id: i64, acting_user_id: i64) -> Result<(), UserServiceError> {
        if id == acting_user_id {
            return Err(UserServiceError::Conflict(
                "You cannot delete your own account".to_string(),
            ));
        }
        let user = self.get_by_id(id).await?.ok_or(UserServiceError::NotFound(id))?;
        if user.is_admin() {
            self.ensure_not_last_admin("delete").await?;
        }

        self.session_repo
            .delete_by_user(id)
            .await
            .context("Failed to delete user sessions")?;
        self.user_repo.delete(id).await.context("Failed to delete user")?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Change the password of `user_id` after checking the current one.
    ///
    /// Every existing session of the user is closed and a fresh one returned.
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<Session, UserServiceError> {
        let mut user = self
            .get_by_id(user_id)
            .await?
            .ok_or(UserServiceError::NotFound(user_id))?;

        let valid = verify_password(current_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }
        check_password_policy(new_password).map_err(UserServiceError::ValidationError)?;

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo.update(&user).await.context("Failed to update password")?;

        self.session_repo
            .delete_by_user(user_id)
            .await
            .context("Failed to close sessions")?;
        self.create_session(user_id).await
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, UserServiceError> {
        if name.trim().is_empty() {
            return Err(UserServiceError::ValidationError("Name cannot be empty".to_string()));
        }
        let email = normalize_email(email)?;
        check_password_policy(password).map_err(UserServiceError::ValidationError)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let user = User::new(name.trim().to_string(), email, password_hash, role);
        Ok(self.user_repo.create(&user).await.context("Failed to create user")?)
    }

    async fn ensure_not_last_admin(&self, action: &str) -> Result<(), UserServiceError> {
        let admins = self
            .user_repo
            .count_by_role(UserRole::Admin)
            .await
            .context("Failed to count admins")?;
        if admins <= 1 {
            return Err(UserServiceError::Conflict(format!(
                "Cannot {} the last admin account",
                action
            )));
        }
        Ok(())
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}

/// Lowercase and sanity-check an email address
fn normalize_email(email: &str) -> Result<String, UserServiceError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(UserServiceError::ValidationError("Invalid email format".to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};

    async fn setup_test_service() -> UserService {
        let pool = migrated_pool().await;
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    fn setup_input(email: &str) -> SetupInput {
        SetupInput {
            name: "Kepala Desa".to_string(),
            email: email.to_string(),
            password: "rahasia-desa".to_string(),
        }
    }

    fn editor_input(email: &str) -> CreateUserInput {
        CreateUserInput {
            name: "Operator".to_string(),
            email: email.to_string(),
            password: "operator-123".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_setup_only_once() {
        let service = setup_test_service().await;
        assert!(!service.has_users().await.unwrap());

        let admin = service.setup_first_admin(setup_input("Kades@Banyuanyar.desa.id")).await.unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.email, "kades@banyuanyar.desa.id");
        assert!(service.has_users().await.unwrap());

        let again = service.setup_first_admin(setup_input("lain@desa.id")).await;
        assert!(matches!(again, Err(UserServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_skips_when_users_exist() {
        let service = setup_test_service().await;
        let admin = BootstrapAdmin {
            name: "Admin".to_string(),
            email: "admin@desa.id".to_string(),
            password: "bootstrap-pass".to_string(),
        };
        assert!(service.bootstrap_admin(&admin).await.unwrap().is_some());
        assert!(service.bootstrap_admin(&admin).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_setup_validation() {
        let service = setup_test_service().await;
        let mut input = setup_input("bukan-email");
        assert!(matches!(
            service.setup_first_admin(input.clone()).await,
            Err(UserServiceError::ValidationError(_))
        ));
        input.email = "kades@desa.id".to_string();
        input.password = "pendek".to_string();
        assert!(matches!(
            service.setup_first_admin(input).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_session_lifecycle() {
        let service = setup_test_service().await;
        service.setup_first_admin(setup_input("kades@desa.id")).await.unwrap();

        let (session, user) = service
            .login(LoginInput::new(" KADES@desa.id ", "rahasia-desa"))
            .await
            .unwrap();
        assert_eq!(user.email, "kades@desa.id");
        assert!(!session.is_expired());

        let current = service.validate_session(&session.id).await.unwrap();
        assert_eq!(current.map(|u| u.id), Some(user.id));

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let pool = migrated_pool().await;
        let sessions = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::new(SqlxUserRepository::boxed(pool), sessions.clone());
        let admin = service.setup_first_admin(setup_input("kades@desa.id")).await.unwrap();

        let stale = Session {
            id: Uuid::new_v4().to_string(),
            user_id: admin.id,
            expires_at: Utc::now() - Duration::hours(1),
            created_at: Utc::now() - Duration::days(8),
        };
        sessions.create(&stale).await.unwrap();

        assert!(service.validate_session(&stale.id).await.unwrap().is_none());
        assert!(sessions.get_by_id(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password_or_unknown_email() {
        let service = setup_test_service().await;
        service.setup_first_admin(setup_input("kades@desa.id")).await.unwrap();

        assert!(matches!(
            service.login(LoginInput::new("kades@desa.id", "salah-sandi")).await,
            Err(UserServiceError::AuthenticationError(_))
        ));
        assert!(matches!(
            service.login(LoginInput::new("siapa@desa.id", "rahasia-desa")).await,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let service = setup_test_service().await;
        let editor = service.create_user(editor_input("op@desa.id")).await.unwrap();
        assert_eq!(editor.role, UserRole::Editor);

        assert!(matches!(
            service.create_user(editor_input("OP@desa.id")).await,
            Err(UserServiceError::UserExists(_))
        ));
    }

    #[tokio::test]
    async fn test_last_admin_is_protected() {
        let service = setup_test_service().await;
        let admin = service.setup_first_admin(setup_input("kades@desa.id")).await.unwrap();
        let editor = service.create_user(editor_input("op@desa.id")).await.unwrap();

        let demote = UpdateUserInput {
            role: Some(UserRole::Editor),
            ..Default::default()
        };
        assert!(matches!(
            service.update_user(admin.id, demote.clone()).await,
            Err(UserServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.delete_user(admin.id, editor.id).await,
            Err(UserServiceError::Conflict(_))
        ));

        // with a second admin the first one can step down
        let promote = UpdateUserInput {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        service.update_user(editor.id, promote).await.unwrap();
        let demoted = service.update_user(admin.id, demote).await.unwrap();
        assert_eq!(demoted.role, UserRole::Editor);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let service = setup_test_service().await;
        let admin = service.setup_first_admin(setup_input("kades@desa.id")).await.unwrap();
        let editor = service.create_user(editor_input("op@desa.id")).await.unwrap();

        assert!(matches!(
            service.delete_user(admin.id, admin.id).await,
            Err(UserServiceError::Conflict(_))
        ));
        service.delete_user(editor.id, admin.id).await.unwrap();
        assert!(service.get_by_id(editor.id).await.unwrap().is_none());
        assert!(matches!(
            service.delete_user(editor.id, admin.id).await,
            Err(UserServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_user_email_conflict() {
        let service = setup_test_service().await;
        service.create_user(editor_input("a@desa.id")).await.unwrap();
        let b = service.create_user(editor_input("b@desa.id")).await.unwrap();

        let input = UpdateUserInput {
            email: Some("A@desa.id".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_user(b.id, input).await,
            Err(UserServiceError::UserExists(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_rotates_sessions() {
        let service = setup_test_service().await;
        let admin = service.setup_first_admin(setup_input("kades@desa.id")).await.unwrap();
        let (old_session, _) = service
            .login(LoginInput::new("kades@desa.id", "rahasia-desa"))
            .await
            .unwrap();

        assert!(matches!(
            service.change_password(admin.id, "keliru", "sandi-baru-123").await,
            Err(UserServiceError::AuthenticationError(_))
        ));

        let fresh = service
            .change_password(admin.id, "rahasia-desa", "sandi-baru-123")
            .await
            .unwrap();
        assert!(service.validate_session(&old_session.id).await.unwrap().is_none());
        assert!(service.validate_session(&fresh.id).await.unwrap().is_some());
        assert!(service
            .login(LoginInput::new("kades@desa.id", "sandi-baru-123"))
            .await
            .is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" A@Desa.ID ").unwrap(), "a@desa.id");
        assert!(normalize_email("a@desa").is_err());
        assert!(normalize_email("@desa.id").is_err());
        assert!(normalize_email("desa.id").is_err());
    }
}
