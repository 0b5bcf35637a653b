//! Cryptographic utilities for secure operations
//!
//! Password hashing (Argon2id), refresh token fingerprints (SHA-256) and
//! constant-time comparison. Hashing is CPU-bound; async callers should run
//! it on the blocking pool.

use argon2::{
    password_hash::{rand_core, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::AuthError;

/// Hash a password using Argon2id, returning the PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            AuthError::Internal("password hashing failed".to_string())
        })
}

/// Verify a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and an error only if the stored hash
/// cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| {
        tracing::error!("Stored password hash is malformed: {}", e);
        AuthError::Internal("stored password hash is malformed".to_string())
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Securely hash a token for storage.
///
/// Uses SHA-256 to create a one-way hash of the token.
/// The original token cannot be recovered from the hash.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison.
///
/// Length is not treated as secret.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
