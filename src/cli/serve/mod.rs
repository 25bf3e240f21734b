//! Serve command - runs the HTTP API

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router_with_state;
use crate::api::state::AppState;
use crate::config::AppConfig;
use crate::infrastructure::observability::{create_metrics_router, init_metrics, PrometheusMetrics};

/// Time allowed for queued audit records to drain on shutdown
const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();

    let application = crate::create_application(&config).await?;
    let metrics = init_metrics(&config.metrics);
    let app = create_app_router(application.state, metrics, &config.metrics.path);

    let addr = build_socket_addr(&config)?;
    info!("Starting account service on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match tokio::time::timeout(AUDIT_DRAIN_TIMEOUT, application.audit_writer).await {
        Ok(Ok(written)) => info!(written, "Audit writer drained"),
        Ok(Err(e)) => warn!(error = %e, "Audit writer task failed"),
        Err(_) => warn!("Audit writer did not drain in time"),
    }

    info!("Account service shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

fn create_app_router(state: AppState, metrics: Option<PrometheusMetrics>, metrics_path: &str) -> Router {
    let router = create_router_with_state(state);

    match metrics {
        Some(m) => router.merge(create_metrics_router(m, metrics_path)),
        None => router,
    }
}
