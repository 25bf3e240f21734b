//! Redis-backed cache shared across service instances

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Connection settings for [`RedisCache`]
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// e.g. `redis://127.0.0.1:6379`
    pub url: String,
    /// Namespace prepended as `{prefix}:{key}`
    pub key_prefix: Option<String>,
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Cache over a multiplexed `ConnectionManager`
///
/// The manager reconnects on its own; a call made while Redis is down fails
/// with `DomainError::Cache` instead of blocking.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    key_prefix: Option<String>,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!(prefix = ?config.key_prefix, "Connected to Redis");

        Ok(Self {
            connection,
            key_prefix: config.key_prefix,
        })
    }

    fn key(&self, key: &str) -> String {
        prefixed(self.key_prefix.as_deref(), key)
    }
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key.to_string(),
    }
}

fn command_error(command: &str, key: &str, e: redis::RedisError) -> DomainError {
    DomainError::cache(format!("Redis {} '{}' failed: {}", command, key, e))
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        conn.get(self.key(key))
            .await
            .map_err(|e| command_error("GET", key, e))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        // SETEX rejects a zero expiry
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.key(key), value, ttl_secs)
            .await
            .map_err(|e| command_error("SETEX", key, e))
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: u32 = conn
            .del(self.key(key))
            .await
            .map_err(|e| command_error("DEL", key, e))?;

        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::cache(format!("Redis PING failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_get_delete() {
        let cache = RedisCache::new(
            RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("account-test"),
        )
        .await
        .unwrap();

        cache.ping().await.unwrap();

        cache
            .set("credential:1", &"digest", Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<String> = cache.get("credential:1").await.unwrap();
        assert_eq!(value, Some("digest".to_string()));

        assert!(cache.delete("credential:1").await.unwrap());
        assert!(!cache.delete("credential:1").await.unwrap());
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(prefixed(Some("accounts"), "credential:1"), "accounts:credential:1");
        assert_eq!(prefixed(None, "credential:1"), "credential:1");
    }

    #[tokio::test]
    async fn test_invalid_url_is_configuration_error() {
        let result = RedisCache::new(RedisCacheConfig::new("not a url")).await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
