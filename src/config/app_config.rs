use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub hashing: HashingSettings,
    pub audit: AuditSettings,
    pub service: ServiceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Metrics endpoint path
    pub path: String,
}

/// Durable store selection
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `in_memory` or `redis`
    pub backend: String,
    pub redis_url: String,
    pub key_prefix: String,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HashingSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Records beyond this many pending are dropped
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Upper bound on every store and cache call
    pub call_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            url: "postgres://localhost/accounts".to_string(),
            max_connections: 10,
            run_migrations: true,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            redis_url: String::new(),
            key_prefix: "accounts".to_string(),
            ttl_secs: 300,
            max_capacity: 10_000,
        }
    }
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self { buffer_size: 1024 }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: 5_000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, DatabaseBackend::InMemory);
        assert_eq!(config.cache.backend, "in_memory");
        assert_eq!(config.service.call_timeout_ms, 5_000);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("database.backend", "postgres")
            .unwrap()
            .set_override("cache.ttl_secs", 60)
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.key_prefix, "accounts");
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
