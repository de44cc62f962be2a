//! Password strength checks and Argon2id hashing.

use anyhow::{anyhow, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

pub(crate) const STRENGTH_MESSAGE: &str =
    "Password must be at least 8 chars, with 1 uppercase, 1 lowercase, 1 number, and 1 symbol.";

/// Strength rule: at least 8 characters with a lowercase letter, an uppercase
/// letter, a digit, and a symbol. Anything outside the ASCII alphanumeric set
/// counts as a symbol, underscore included.
pub(crate) fn strong_password(password: &str) -> bool {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;

    for ch in password.chars() {
        if ch.is_ascii_lowercase() {
            lower = true;
        } else if ch.is_ascii_uppercase() {
            upper = true;
        } else if ch.is_ascii_digit() {
            digit = true;
        } else {
            symbol = true;
        }
    }

    password.chars().count() >= 8 && lower && upper && digit && symbol
}

/// Hash a password with Argon2id and a fresh random salt.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| anyhow!("failed to hash password"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored hash; a wrong password is `Ok(false)`.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| anyhow!("invalid password hash"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
