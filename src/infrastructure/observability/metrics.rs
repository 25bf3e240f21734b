//! Prometheus metrics infrastructure

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("account_service_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Outcome label for operation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Record a credential cache lookup
pub fn record_credential_cache_lookup(hit: bool) {
    if hit {
        counter!("credential_cache_hits_total").increment(1);
    } else {
        counter!("credential_cache_misses_total").increment(1);
    }
}

/// Record the outcome of an account operation
pub fn record_account_operation(operation: &'static str, outcome: Outcome) {
    counter!(
        "account_operations_total",
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record an authentication attempt
pub fn record_authentication(outcome: Outcome) {
    counter!("authentication_attempts_total", "outcome" => outcome.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<(), ()> = Ok(());
        let err: Result<(), ()> = Err(());

        assert_eq!(Outcome::from_result(&ok), Outcome::Success);
        assert_eq!(Outcome::from_result(&err).as_str(), "failure");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_credential_cache_lookup(true);
        record_credential_cache_lookup(false);
        record_account_operation("create_account", Outcome::Success);
        record_authentication(Outcome::Failure);
    }
}
