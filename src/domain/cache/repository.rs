//! Cache trait definition

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Key-value cache holding JSON strings with a per-entry TTL
///
/// Values are raw strings so the trait stays dyn-compatible; [`CacheExt`]
/// adds typed access on top.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Remove a key, returning whether it was present
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Round-trip to the backend without touching any key
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Typed get/set over [`Cache`] using serde_json
pub trait CacheExt: Cache {
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value = serde_json::from_str::<V>(&data).map_err(|e| {
                        DomainError::cache(format!("Undecodable entry under '{}': {}", key, e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Unencodable entry for '{}': {}", key, e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
