//! Credential hashing using Argon2id

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// One-way salted hashing of plaintext passwords
#[cfg_attr(test, automock)]
pub trait CredentialHasher: Send + Sync {
    /// Produce a self-describing digest; the salt is embedded in the output
    fn hash(&self, plaintext: &str) -> Result<String, DomainError>;

    /// Check a plaintext against a digest; malformed digests never match
    fn verify(&self, digest: &str, plaintext: &str) -> bool;
}

/// Argon2id hasher with configurable cost
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Memory in KiB, iteration count and lane count
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            DomainError::configuration(format!("Invalid hashing parameters: {}", e))
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // Cost parameters are read from the digest itself
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
