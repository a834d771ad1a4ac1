//! Consultation endpoints for doctors.
//!
//! Every route here sits behind the authentication middleware and the
//! `require_role` guard for [`REQUIRED_ROLE`]. Handlers stay thin: extract,
//! delegate to [`ConsultationGateway`](crate::services::ConsultationGateway),
//! return the test request(s) as JSON.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    response::Json,
};
use tracing::debug;

use crate::app_state::AppState;
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::Role;
use crate::error::{ErrorResponse, Result};
use crate::models::{ConsultationInput, TestRequest};

/// Role every consultation operation is gated on
pub const REQUIRED_ROLE: Role = Role::Doctor;

/// List test requests waiting for a doctor
#[utoipa::path(
    get,
    path = "/api/consultations/in-queue",
    tag = "consultations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests with a completed lab test", body = Vec<TestRequest>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a doctor", body = ErrorResponse)
    )
)]
pub async fn list_in_queue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<Vec<TestRequest>>> {
    debug!(user_id = %claims.sub, "Listing consultation queue");
    let requests = state.gateway.list_queued().await?;
    Ok(Json(requests))
}

/// List test requests assigned to the calling doctor
#[utoipa::path(
    get,
    path = "/api/consultations",
    tag = "consultations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests assigned to the caller", body = Vec<TestRequest>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a doctor", body = ErrorResponse)
    )
)]
pub async fn list_for_doctor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<Vec<TestRequest>>> {
    let requests = state.gateway.list_for_current_doctor(&claims).await?;
    Ok(Json(requests))
}

/// Assign a queued test request to the calling doctor
#[utoipa::path(
    put,
    path = "/api/consultations/assign/{id}",
    tag = "consultations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Test request id")),
    responses(
        (status = 200, description = "Request assigned to the caller", body = TestRequest),
        (status = 400, description = "Unknown id or request not waiting for consultation", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a doctor", body = ErrorResponse)
    )
)]
pub async fn assign(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<TestRequest>> {
    let Path(id) = id?;
    let request = state.gateway.assign(&claims, id).await?;
    Ok(Json(request))
}

/// Record the calling doctor's findings and complete the consultation
#[utoipa::path(
    put,
    path = "/api/consultations/update/{id}",
    tag = "consultations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Test request id")),
    request_body = ConsultationInput,
    responses(
        (status = 200, description = "Consultation completed", body = TestRequest),
        (status = 400, description = "Invalid findings, unknown id or wrong state", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a doctor or not the assigned doctor", body = ErrorResponse)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<ConsultationInput>, JsonRejection>,
) -> Result<Json<TestRequest>> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let request = state.gateway.update(&claims, id, input).await?;
    Ok(Json(request))
}
