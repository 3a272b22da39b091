//! Argon2 password hashing
//!
//! Hashing and verification are CPU-bound, so both run on the blocking
//! thread pool instead of a runtime worker.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Well-formed hash with default parameters that matches no password.
///
/// Verified on unknown usernames so lookups cost the same as a real check.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$8+6PTkoyHyITF8NMtGQ3Jw$Eks8wecjuVoZfzibO2hJsn2rHiIouNoVXlHEeIfNpiI";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash `password` into a PHC string
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| PasswordError::Hash(format!("Task join error: {}", e)))?
}

/// Check `password` against a stored PHC string; malformed hashes never match
pub async fn verify_password(hash: &str, password: &str) -> Result<bool, PasswordError> {
    let hash = hash.to_string();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_blocking(&hash, &password))
        .await
        .map_err(|e| PasswordError::Hash(format!("Task join error: {}", e)))
}
