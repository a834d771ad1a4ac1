//! Public routes that don't require authentication.
//!
//! Includes: health check, Prometheus metrics, Swagger UI.

use axum::{routing::get, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::auth::Role;
use crate::error::{ErrorCode, ErrorDetail, ErrorResponse, FieldViolation};
use crate::handlers::{self, consultations, health};
use crate::models::{
    Consultation, ConsultationInput, DoctorSuggestion, RequestStatus, TestRequest, User,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(title = "Consultation Gateway API", version = "1.0.0"),
    paths(
        health::health_check,
        handlers::metrics::get_prometheus_metrics,
        consultations::list_in_queue,
        consultations::list_for_doctor,
        consultations::assign,
        consultations::update,
    ),
    components(schemas(
        TestRequest,
        Consultation,
        ConsultationInput,
        DoctorSuggestion,
        RequestStatus,
        User,
        Role,
        health::HealthStatus,
        ErrorResponse,
        ErrorDetail,
        ErrorCode,
        FieldViolation,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "consultations", description = "Doctor consultation workflow"),
        (name = "health", description = "Service health"),
        (name = "metrics", description = "Prometheus metrics")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build public routes that don't require authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(handlers::metrics::get_prometheus_metrics))
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
}
