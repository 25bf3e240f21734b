//! Liveness and readiness probes

use std::future::Future;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::domain::DomainError;

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<ComponentCheck>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of probing one dependency
#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

impl HealthResponse {
    fn from_checks(checks: Vec<ComponentCheck>) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

async fn probe<F>(name: &'static str, check: F) -> ComponentCheck
where
    F: Future<Output = Result<(), DomainError>>,
{
    let started = Instant::now();
    let result = check.await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => ComponentCheck {
            name,
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Err(e) => {
            tracing::warn!(component = name, error = %e, "Readiness probe failed");

            ComponentCheck {
                name,
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
                latency_ms,
            }
        }
    }
}

/// Always healthy while the process serves requests
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::from_checks(Vec::new()))
}

/// Probes the account store and the credential cache
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.account_service;

    let checks = vec![
        probe("account_store", service.check_store()).await,
        probe("credential_cache", service.check_cache()).await,
    ];

    let response = HealthResponse::from_checks(checks);
    (response.status_code(), Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
