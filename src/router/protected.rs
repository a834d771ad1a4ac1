//! Protected routes that require authentication and the DOCTOR role.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};

use crate::app_state::AppState;
use crate::auth::middleware::{auth_middleware, require_role};
use crate::handlers::consultations::{self, REQUIRED_ROLE};

/// Build protected routes that require authentication.
///
/// Both guards are route layers, so they only run for matched routes and
/// unknown paths still 404. The last layer added runs first: authentication,
/// then the role check.
pub fn protected_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/consultations/in-queue",
            get(consultations::list_in_queue),
        )
        .route("/api/consultations", get(consultations::list_for_doctor))
        .route("/api/consultations/assign/{id}", put(consultations::assign))
        .route("/api/consultations/update/{id}", put(consultations::update))
        .route_layer(from_fn_with_state(REQUIRED_ROLE, require_role))
        .route_layer(from_fn_with_state(app_state, auth_middleware))
}
