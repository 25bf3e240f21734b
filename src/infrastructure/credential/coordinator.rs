//! Cache-aside access to active credentials

use std::sync::Arc;
use std::time::Duration;

use crate::domain::account::{AccountId, AccountStore};
use crate::domain::credential::{Credential, CredentialCache};
use crate::domain::DomainError;
use crate::infrastructure::deadline::with_deadline;
use crate::infrastructure::observability::record_credential_cache_lookup;

/// Serves active credentials cache-first, falling back to the durable store
///
/// The cache only ever holds copies of stored records. Losing it costs
/// latency, never correctness.
pub struct CredentialCacheAside {
    store: Arc<dyn AccountStore>,
    cache: Arc<dyn CredentialCache>,
    call_timeout: Duration,
}

impl std::fmt::Debug for CredentialCacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCacheAside")
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl CredentialCacheAside {
    pub fn new(
        store: Arc<dyn AccountStore>,
        cache: Arc<dyn CredentialCache>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            call_timeout,
        }
    }

    /// Look up the active credential of an account
    ///
    /// Store errors, including `NotFound`, are returned unchanged. Cache
    /// failures are logged and treated as a miss.
    pub async fn get_active_credential(
        &self,
        account_id: &AccountId,
    ) -> Result<Credential, DomainError> {
        match with_deadline("cache.get", self.call_timeout, self.cache.get(account_id)).await {
            Ok(Some(credential)) if credential.account_id() == account_id => {
                record_credential_cache_lookup(true);
                return Ok(credential);
            }
            Ok(Some(credential)) => {
                tracing::warn!(
                    account_id = %account_id,
                    cached_account_id = %credential.account_id(),
                    "Cached credential belongs to another account, ignoring"
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "Credential cache read failed");
            }
        }

        record_credential_cache_lookup(false);

        let credential = with_deadline(
            "store.get_active_credential",
            self.call_timeout,
            self.store.get_active_credential(account_id),
        )
        .await?;

        if let Err(e) = with_deadline("cache.set", self.call_timeout, self.cache.set(&credential)).await {
            tracing::warn!(account_id = %account_id, error = %e, "Failed to warm credential cache");
        }

        Ok(credential)
    }

    /// Write a credential through to the store, then the cache
    ///
    /// The cache is not touched when the store write fails. When the cache
    /// write fails the old entry is dropped before the error is returned, so
    /// the next read goes to the store.
    pub async fn set_credential(&self, credential: Credential) -> Result<Credential, DomainError> {
        let saved = with_deadline(
            "store.save_credential",
            self.call_timeout,
            self.store.save_credential(credential),
        )
        .await?;

        if let Err(e) = with_deadline("cache.set", self.call_timeout, self.cache.set(&saved)).await {
            if let Err(evict_err) = self.evict(saved.account_id()).await {
                tracing::error!(
                    account_id = %saved.account_id(),
                    error = %evict_err,
                    "Failed to drop stale credential after cache write failure"
                );
            }

            return Err(e);
        }

        Ok(saved)
    }

    /// Check that the cache backend answers within the call timeout
    pub async fn ping(&self) -> Result<(), DomainError> {
        with_deadline("cache.ping", self.call_timeout, self.cache.ping()).await
    }

    /// Drop the cached entry for an account
    pub async fn evict(&self, account_id: &AccountId) -> Result<(), DomainError> {
        with_deadline("cache.delete", self.call_timeout, self.cache.delete(account_id)).await
    }
}
