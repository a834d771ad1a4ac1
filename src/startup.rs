//! Application startup and initialization logic.

use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::auth::jwt::JwtService;
use crate::config::{Config, LogFormat};
use crate::services::{
    ClaimsUserLoggedInService, ConsultationGateway, InMemoryFlowLog, InMemoryTestRequestStore,
};

const DEFAULT_LOG_FILTER: &str = "consultation_gateway=debug,tower_http=debug";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Initialize application services and create the AppState.
pub async fn initialize_app(config: &Config) -> Result<AppState> {
    info!("Starting consultation gateway ({})", config.environment);

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    info!("Prometheus metrics initialized");

    let store = Arc::new(InMemoryTestRequestStore::new(Arc::new(InMemoryFlowLog::new())));
    if let Some(path) = &config.seed_file {
        store.load_fixtures(path)?;
    }

    build_app_state(config, store, metrics_handle)
}

/// Wire the gateway over `store` and assemble the shared state.
pub fn build_app_state(
    config: &Config,
    store: Arc<InMemoryTestRequestStore>,
    metrics_handle: PrometheusHandle,
) -> Result<AppState> {
    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expiration)
        .map_err(|e| anyhow::anyhow!("Failed to initialize JWT service: {}", e))?;

    let gateway = ConsultationGateway::new(
        store.clone(),
        store,
        Arc::new(ClaimsUserLoggedInService),
    );

    Ok(AppState {
        config: config.clone(),
        jwt_service,
        gateway,
        metrics_handle,
    })
}

/// Wait for SIGTERM or SIGINT signal for graceful shutdown
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}
