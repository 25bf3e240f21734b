//! Key-value cache abstraction used by the credential cache

mod repository;

pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
