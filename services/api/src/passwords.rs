//! Password hashing with argon2id PHC strings

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use thiserror::Error;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Hashes and verifies account passwords
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Stand-in hash verified when there is no stored one to check
    dummy_hash: String,
}

impl PasswordService {
    pub fn new(config: &HashingConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::Params(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut rand::thread_rng());
        let dummy_hash = argon2
            .hash_password(b"no-such-account", &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check a password against a stored PHC string. Unparseable hashes never match.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Spend the same work as [`verify`](Self::verify) for an account that
    /// does not exist. Always fails.
    pub fn verify_missing(&self, password: &str) -> bool {
        self.verify(password, &self.dummy_hash);
        false
    }
}
