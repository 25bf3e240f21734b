//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use self::metrics::{
    create_metrics_router, init_metrics, record_account_operation, record_authentication,
    record_credential_cache_lookup, Outcome, PrometheusMetrics,
};
