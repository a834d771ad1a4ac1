//! Doctor-facing consultation operations.
//!
//! Each operation resolves the caller through [`UserLoggedInService`] where it
//! needs a principal, then makes exactly one collaborator call. Collaborator
//! failures are mapped to [`ApiError`]: domain and validation errors become
//! 400s for the caller to act on, anything else keeps its own status.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::Claims;
use crate::error::{ApiError, Result};
use crate::middleware::metrics::track_consultation_operation;
use crate::models::{ConsultationInput, RequestStatus, TestRequest, User};
use crate::services::traits::{
    ServiceError, TestRequestQueryService, TestRequestUpdateService, UserLoggedInService,
};

#[derive(Clone)]
pub struct ConsultationGateway {
    query_service: Arc<dyn TestRequestQueryService>,
    update_service: Arc<dyn TestRequestUpdateService>,
    login_service: Arc<dyn UserLoggedInService>,
}

impl ConsultationGateway {
    pub fn new(
        query_service: Arc<dyn TestRequestQueryService>,
        update_service: Arc<dyn TestRequestUpdateService>,
        login_service: Arc<dyn UserLoggedInService>,
    ) -> Self {
        Self {
            query_service,
            update_service,
            login_service,
        }
    }

    /// Requests whose lab test is done and which wait for a doctor
    pub async fn list_queued(&self) -> Result<Vec<TestRequest>> {
        let outcome = self
            .query_service
            .find_by_status(RequestStatus::LabTestCompleted)
            .await;
        Self::finish("list_queued", outcome)
    }

    /// Requests assigned to the calling doctor
    pub async fn list_for_current_doctor(&self, claims: &Claims) -> Result<Vec<TestRequest>> {
        let doctor = self.current_doctor(claims).await?;
        let outcome = self.query_service.find_by_doctor(&doctor).await;
        Self::finish("list_for_current_doctor", outcome)
    }

    /// Claim a queued request for the calling doctor
    pub async fn assign(&self, claims: &Claims, id: i64) -> Result<TestRequest> {
        let doctor = self.current_doctor(claims).await?;
        let outcome = self
            .update_service
            .assign_for_consultation(id, &doctor)
            .await;

        if outcome.is_ok() {
            info!(
                test_request_id = id,
                doctor_id = %doctor.id,
                "Test request assigned for consultation"
            );
        }
        Self::finish("assign", outcome)
    }

    /// Record the calling doctor's findings on a request
    pub async fn update(
        &self,
        claims: &Claims,
        id: i64,
        input: ConsultationInput,
    ) -> Result<TestRequest> {
        let doctor = self.current_doctor(claims).await?;
        let outcome = self
            .update_service
            .update_consultation(id, input, &doctor)
            .await;

        if outcome.is_ok() {
            info!(
                test_request_id = id,
                doctor_id = %doctor.id,
                "Consultation updated"
            );
        }
        Self::finish("update", outcome)
    }

    async fn current_doctor(&self, claims: &Claims) -> Result<User> {
        self.login_service
            .logged_in_user(claims)
            .await
            .map_err(ApiError::from)
    }

    fn finish<T>(operation: &'static str, outcome: std::result::Result<T, ServiceError>) -> Result<T> {
        match outcome {
            Ok(value) => {
                track_consultation_operation(operation, "ok");
                Ok(value)
            }
            Err(err) => {
                let outcome = match &err {
                    ServiceError::Domain(_) | ServiceError::Validation(_) => "rejected",
                    _ => "failed",
                };
                warn!(operation, outcome, error = %err, "Consultation operation did not succeed");
                track_consultation_operation(operation, outcome);
                Err(ApiError::from(err))
            }
        }
    }
}
