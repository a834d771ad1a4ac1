//! Router configuration module.
//!
//! Public routes (health, metrics, API docs) and the DOCTOR-gated
//! consultation routes share one middleware stack.

use std::time::Duration;

use axum::{http::StatusCode, middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::middleware::{add_security_headers, metrics_middleware, request_logger_middleware};

pub mod protected;
pub mod public;

pub use public::ApiDoc;

/// Build the application router.
pub fn build_router(app_state: AppState) -> Router {
    let request_timeout = Duration::from_secs(app_state.config.request_timeout);

    public::public_routes()
        .merge(protected::protected_routes(app_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(request_logger_middleware))
                .layer(from_fn(metrics_middleware))
                .layer(from_fn(add_security_headers))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}
