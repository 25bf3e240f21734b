//! Runtime selection of the cache backend

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheSettings;
use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Backend plus the settings only that backend reads
#[derive(Debug, Clone, PartialEq)]
pub enum CacheBackend {
    InMemory { max_capacity: u64 },
    Redis { url: String, key_prefix: Option<String> },
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory { .. } => f.write_str("in_memory"),
            Self::Redis { .. } => f.write_str("redis"),
        }
    }
}

/// Resolved `[cache]` section
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Lifetime of cached credentials
    pub ttl: Duration,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl CacheConfig {
    /// Validates the settings; the Redis backend needs a URL
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, DomainError> {
        let backend = match settings.backend.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => CacheBackend::InMemory {
                max_capacity: settings.max_capacity,
            },
            "redis" => CacheBackend::Redis {
                url: non_blank(&settings.redis_url).ok_or_else(|| {
                    DomainError::configuration("cache.redis_url is required for the redis backend")
                })?,
                key_prefix: non_blank(&settings.key_prefix),
            },
            other => {
                return Err(DomainError::configuration(format!(
                    "Unknown cache backend '{}', expected in_memory or redis",
                    other
                )))
            }
        };

        Ok(Self {
            backend,
            ttl: Duration::from_secs(settings.ttl_secs),
        })
    }

    /// Open the configured backend
    pub async fn connect(&self) -> Result<Arc<dyn Cache>, DomainError> {
        let cache: Arc<dyn Cache> = match &self.backend {
            CacheBackend::InMemory { max_capacity } => Arc::new(InMemoryCache::with_config(
                InMemoryCacheConfig::default()
                    .with_max_capacity(*max_capacity)
                    .with_default_ttl(self.ttl),
            )),
            CacheBackend::Redis { url, key_prefix } => {
                let mut redis_config = RedisCacheConfig::new(url.clone());
                if let Some(prefix) = key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                Arc::new(RedisCache::new(redis_config).await?)
            }
        };

        tracing::info!(backend = %self.backend, ttl_secs = self.ttl.as_secs(), "Cache backend ready");

        Ok(cache)
    }
}
