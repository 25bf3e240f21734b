//! Credential cache trait

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::entity::Credential;
use crate::domain::account::AccountId;
use crate::domain::DomainError;

/// Fast key-value store of credentials keyed by owning account id
///
/// Never a source of truth: every entry must be reproducible from the
/// durable store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialCache: Send + Sync {
    /// Get the cached credential, `None` on miss
    async fn get(&self, account_id: &AccountId) -> Result<Option<Credential>, DomainError>;

    /// Insert or replace the entry for the credential's account
    async fn set(&self, credential: &Credential) -> Result<(), DomainError>;

    /// Remove the entry; a missing entry is not an error
    async fn delete(&self, account_id: &AccountId) -> Result<(), DomainError>;

    /// Check that the backing cache answers
    async fn ping(&self) -> Result<(), DomainError>;
}
