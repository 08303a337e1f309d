//! Password hashing and policy checks.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::errors::AuthError;
use crate::settings::PasswordPolicy;

/// Hash a plaintext password with Argon2id into PHC string format.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Other(format!("Password hashing failed: {}", e)))?
        .to_string();
    Ok(password_hash)
}

/// Verify a plaintext password against a stored PHC hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::Other(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

impl PasswordPolicy {
    /// Check a candidate password against this policy.
    pub fn check(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::PasswordPolicy(format!(
                "must be at least {} characters",
                self.min_length
            )));
        }
        if self.require_letter && !password.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(AuthError::PasswordPolicy(
                "must contain at least one letter".to_string(),
            ));
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::PasswordPolicy(
                "must contain at least one digit".to_string(),
            ));
        }
        Ok(())
    }
}
