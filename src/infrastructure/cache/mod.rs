//! Cache infrastructure - Cache implementations

mod credential;
mod factory;
mod in_memory;
mod redis;

pub use credential::KeyValueCredentialCache;
pub use factory::{CacheBackend, CacheConfig};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use self::redis::{RedisCache, RedisCacheConfig};
