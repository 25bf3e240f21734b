//! PostgreSQL connection pooling

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::DomainError;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool sizing for the account store
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: ACQUIRE_TIMEOUT,
        }
    }

    /// Zero is raised to one connection
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }
}

/// Opens a lazily-growing pool and verifies one connection
pub async fn connect_pool(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("PostgreSQL connection failed: {}", e)))?;

    tracing::debug!(max_connections = config.max_connections, "PostgreSQL pool ready");

    Ok(pool)
}
