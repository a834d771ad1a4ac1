//! Collaborator contracts consumed by the consultation gateway.
//!
//! The gateway only depends on these traits; the in-memory store and the
//! claims-based login service are the reference implementations wired at
//! startup, and tests substitute their own.

use async_trait::async_trait;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::Claims;
use crate::models::{ConsultationInput, RequestStatus, TestRequest, TestRequestFlow, User};

/// Failure reported by a collaborator.
///
/// `Domain` and `Validation` are the caller-diagnosable outcomes. The rest
/// describe problems the caller cannot fix by changing the request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business-rule violation: unknown id, illegal state transition.
    #[error("{0}")]
    Domain(String),

    /// Payload failed field-level constraints.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Read side of the test request workflow
#[async_trait]
pub trait TestRequestQueryService: Send + Sync {
    /// All requests currently in `status`
    async fn find_by_status(&self, status: RequestStatus) -> ServiceResult<Vec<TestRequest>>;

    /// All requests whose consultation is assigned to `doctor`
    async fn find_by_doctor(&self, doctor: &User) -> ServiceResult<Vec<TestRequest>>;
}

/// Write side of the consultation stage
#[async_trait]
pub trait TestRequestUpdateService: Send + Sync {
    /// Claim a request for consultation. Must be atomic per request id.
    async fn assign_for_consultation(&self, id: i64, doctor: &User) -> ServiceResult<TestRequest>;

    /// Record the doctor's findings and close the consultation
    async fn update_consultation(
        &self,
        id: i64,
        input: ConsultationInput,
        doctor: &User,
    ) -> ServiceResult<TestRequest>;
}

/// Resolves the principal behind the current request
#[async_trait]
pub trait UserLoggedInService: Send + Sync {
    async fn logged_in_user(&self, claims: &Claims) -> ServiceResult<User>;
}

/// Audit trail of status transitions
#[async_trait]
pub trait TestRequestFlowService: Send + Sync {
    async fn log(
        &self,
        request: &TestRequest,
        from: RequestStatus,
        to: RequestStatus,
        changed_by: &User,
    ) -> ServiceResult<TestRequestFlow>;

    async fn find_by_request(&self, request_id: i64) -> ServiceResult<Vec<TestRequestFlow>>;
}
