//! Argon2-based hashing for principal secrets.
//!
//! Hashes use Argon2id with default parameters and a random salt, stored in
//! PHC string format. Both hashing and verification are deliberately slow,
//! so the async wrappers move the work onto the blocking thread pool.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::AuthResult;
use crate::error::AuthError;

/// Hash of a throwaway secret, verified against when no principal matches a
/// login so both paths cost the same.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_secret("carelink-timing-equalizer").ok());

/// Hash a secret for storage using Argon2id.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
///
/// # Example
///
/// ```
/// use carelink_auth::password::{hash_secret, verify_secret};
///
/// let hash = hash_secret("Str0ngPass1").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_secret("Str0ngPass1", &hash).unwrap());
/// ```
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a secret against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the hash is malformed.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if `hash` is not a valid PHC string.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Hashes `secret` on the blocking thread pool.
///
/// # Errors
///
/// Returns `AuthError::Internal` if hashing fails or the task panics.
pub async fn hash_secret_blocking(secret: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_secret(&secret))
        .await
        .map_err(|e| AuthError::internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AuthError::internal(format!("failed to hash secret: {e}")))
}

/// Verifies `secret` against `hash` on the blocking thread pool.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the stored hash is malformed or the task panics.
pub async fn verify_secret_blocking(secret: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || verify_secret(&secret, &hash))
        .await
        .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))?
        .map_err(|e| AuthError::internal(format!("stored hash is malformed: {e}")))
}

/// Burns one verification's worth of work. Used when the login identifier
/// matched nobody.
pub async fn verify_dummy(secret: String) {
    let Some(hash) = DUMMY_HASH.as_ref() else {
        return;
    };
    let hash = hash.clone();
    let _ = tokio::task::spawn_blocking(move || verify_secret(&secret, &hash)).await;
}
