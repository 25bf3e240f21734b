//! Credential domain
//!
//! Password digest records and the cache contract used to serve them.

mod cache;
mod entity;

pub use cache::CredentialCache;
pub use entity::{Credential, CredentialId, CredentialStatus};

#[cfg(test)]
pub use cache::MockCredentialCache;
