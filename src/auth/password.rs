//! Password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

/// One-way password hashing used by registration and login.
pub trait PasswordEncoder: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// False for a wrong password and for a digest we cannot parse.
    fn matches(&self, plaintext: &str, digest: &str) -> bool;
}

/// Argon2id with a random salt per hash, stored in PHC string format.
#[derive(Default)]
pub struct Argon2Encoder {
    argon2: Argon2<'static>,
}

impl PasswordEncoder for Argon2Encoder {
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::InternalError(format!("password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn matches(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
