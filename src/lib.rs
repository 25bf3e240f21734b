//! Account Service
//!
//! User accounts with rule-based validation, argon2 password credentials and
//! a cache-aside read path for credential verification:
//! - Durable storage in memory or PostgreSQL
//! - Credential cache in memory (moka) or Redis
//! - Failure auditing on a non-blocking side channel

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::api::state::AppState;
use crate::config::{DatabaseBackend, DatabaseSettings};
use crate::domain::account::AccountStore;
use crate::infrastructure::account::{AccountService, Argon2Hasher, InMemoryAccountStore, PostgresAccountStore};
use crate::infrastructure::audit::spawn_audit_writer;
use crate::infrastructure::cache::{CacheConfig, KeyValueCredentialCache};
use crate::infrastructure::storage::{connect_pool, Migrator, PostgresConfig, PostgresMigrator};

/// Wired application plus the background audit writer
pub struct Application {
    pub state: AppState,
    /// Completes once every audit sender is dropped
    pub audit_writer: JoinHandle<u64>,
}

/// Build the application from configuration
pub async fn create_application(config: &AppConfig) -> anyhow::Result<Application> {
    let store = create_account_store(&config.database).await?;

    let cache_config = CacheConfig::from_settings(&config.cache)?;
    let cache = cache_config.connect().await?;
    let credential_cache = Arc::new(KeyValueCredentialCache::new(cache, cache_config.ttl));

    let hasher = Arc::new(Argon2Hasher::with_params(
        config.hashing.memory_kib,
        config.hashing.iterations,
        config.hashing.parallelism,
    )?);

    let (audit, audit_writer) = spawn_audit_writer(config.audit.buffer_size);

    let account_service = AccountService::new(
        store,
        credential_cache,
        hasher,
        audit,
        Duration::from_millis(config.service.call_timeout_ms),
    );

    Ok(Application {
        state: AppState::new(Arc::new(account_service)),
        audit_writer,
    })
}

async fn create_account_store(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn AccountStore>> {
    info!("Account store backend: {:?}", settings.backend);

    match settings.backend {
        DatabaseBackend::InMemory => Ok(Arc::new(InMemoryAccountStore::new())),
        DatabaseBackend::Postgres => {
            let pool = connect_postgres(settings).await?;

            if settings.run_migrations {
                PostgresMigrator::new(pool.clone()).run().await?;
            }

            Ok(Arc::new(PostgresAccountStore::new(pool)))
        }
    }
}

/// Open the PostgreSQL pool described by the database settings
pub async fn connect_postgres(settings: &DatabaseSettings) -> anyhow::Result<sqlx::PgPool> {
    if settings.url.trim().is_empty() {
        anyhow::bail!("database.url is required for the postgres backend");
    }

    info!("Connecting to PostgreSQL...");
    let pool = connect_pool(
        &PostgresConfig::new(settings.url.clone()).with_max_connections(settings.max_connections),
    )
    .await?;
    info!("PostgreSQL connection established");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_builds_in_memory_application() {
        let application = create_application(&AppConfig::default()).await.unwrap();

        assert!(application.state.account_service.check_dependencies().await.is_ok());

        drop(application.state);
        assert_eq!(application.audit_writer.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_url() {
        let mut config = AppConfig::default();
        config.database.backend = DatabaseBackend::Postgres;
        config.database.url = String::new();

        assert!(create_application(&config).await.is_err());
    }
}
