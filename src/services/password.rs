//! Password hashing
//!
//! Argon2id with the crate's default parameters and a random salt per hash.
//! Stored hashes are PHC strings (`$argon2id$v=19$...`).

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Minimum accepted length for a new password
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// A wrong password is `Ok(false)`; a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

/// Check a password chosen by a user (setup, account creation, change).
pub fn check_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if password.trim().is_empty() {
        return Err("Password cannot be blank".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_and_salted() {
        let first = hash_password("rahasia-desa").unwrap();
        let second = hash_password("rahasia-desa").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("rahasia-desa"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("kopi-banyuanyar").unwrap();
        assert!(verify_password("kopi-banyuanyar", &hash).unwrap());
        assert!(!verify_password("kopi-lain", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(check_password_policy("pendek").is_err());
        assert!(check_password_policy("        ").is_err());
        assert!(check_password_policy("cukup-panjang").is_ok());
        // counted in characters, not bytes
        assert!(check_password_policy("désa123").is_err());
    }
}
