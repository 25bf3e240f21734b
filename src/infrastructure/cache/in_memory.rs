//! Process-local cache using moka

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Capacity and lifetime bounds for [`InMemoryCache`]
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    pub max_capacity: u64,
    /// Hard cap on entry lifetime; a shorter per-entry TTL still wins
    pub default_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at_ms: u128,
}

impl Entry {
    fn is_expired(&self) -> bool {
        now_ms() >= self.expires_at_ms
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Bounded cache for single-instance deployments and tests
///
/// Entries are evicted by capacity and by the configured lifetime cap;
/// per-entry TTLs are enforced on read.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: MokaCache<String, Entry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.default_ttl)
            .build();

        Self { entries }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.entries.get(key).await {
            Some(entry) if entry.is_expired() => {
                self.entries.invalidate(key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at_ms: now_ms() + ttl.as_millis(),
        };

        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.entries.remove(key).await.is_some())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
