use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// hash_password
///
/// One-way hashes a plaintext password with Argon2id and a fresh random salt.
/// The returned PHC-format digest embeds the algorithm identifier, parameters,
/// and salt, so `verify_password` needs nothing beyond the digest itself.
/// The plaintext is never stored or logged.
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// verify_password
///
/// Checks a plaintext candidate against a stored digest. Returns `false` for a
/// mismatch *or* a malformed digest; a wrong password is a normal outcome at the
/// login form, never an error.
pub fn verify_password(digest: &str, plaintext: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
