//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with the hash.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

// Verified against when the username is unknown, so both failure paths cost one hash.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    hash_password(&SecretString::from("clicker-dummy-password".to_string())).ok()
});

/// Hash a plain password with a fresh random salt.
pub(crate) fn hash_password(password: &SecretString) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a password against a stored PHC string.
pub(crate) fn verify_password(password: &SecretString, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!("Stored password hash is not a valid PHC string: {err}");
            false
        }
    }
}

/// Burn the same work as a real verification and always fail.
pub(crate) fn verify_dummy(password: &SecretString) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}
