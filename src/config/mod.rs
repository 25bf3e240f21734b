//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuditSettings, CacheSettings, DatabaseBackend, DatabaseSettings, HashingSettings,
    LogFormat, LoggingConfig, MetricsConfig, ServerConfig, ServiceSettings,
};
