//! Application state shared across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::services::ConsultationGateway;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// JWT authentication service
    pub jwt_service: JwtService,
    /// Doctor-facing consultation operations
    pub gateway: ConsultationGateway,
    /// Renders the Prometheus scrape output
    pub metrics_handle: PrometheusHandle,
}
