//! Credential cache backed by a generic key-value cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::account::AccountId;
use crate::domain::cache::{Cache, CacheExt};
use crate::domain::credential::{Credential, CredentialCache};
use crate::domain::DomainError;

const KEY_PREFIX: &str = "credential";

/// Stores credentials as JSON under `credential:{account_id}`
pub struct KeyValueCredentialCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl std::fmt::Debug for KeyValueCredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueCredentialCache")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl KeyValueCredentialCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn key(account_id: &AccountId) -> String {
        format!("{}:{}", KEY_PREFIX, account_id)
    }
}

#[async_trait]
impl CredentialCache for KeyValueCredentialCache {
    async fn get(&self, account_id: &AccountId) -> Result<Option<Credential>, DomainError> {
        self.cache.get(&Self::key(account_id)).await
    }

    async fn set(&self, credential: &Credential) -> Result<(), DomainError> {
        self.cache
            .set(&Self::key(credential.account_id()), credential, self.ttl)
            .await
    }

    async fn delete(&self, account_id: &AccountId) -> Result<(), DomainError> {
        self.cache.delete(&Self::key(account_id)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.cache.ping().await
    }
}
