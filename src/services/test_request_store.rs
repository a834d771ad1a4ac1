//! In-memory test request store.
//!
//! Backs both the query and the update collaborator. Status transitions for
//! the consultation stage:
//!
//! ```text
//! LAB_TEST_COMPLETED --assign--> DIAGNOSIS_IN_PROCESS --update--> COMPLETED
//! ```
//!
//! Each transition is a check-and-set under the per-entry lock of the map,
//! so concurrent claims on the same request resolve to a single winner.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::models::{Consultation, ConsultationInput, RequestStatus, TestRequest, User};
use crate::services::traits::{
    ServiceError, ServiceResult, TestRequestFlowService, TestRequestQueryService,
    TestRequestUpdateService,
};

const INVALID_ID_OR_STATE: &str = "Invalid ID or State";

pub struct InMemoryTestRequestStore {
    requests: DashMap<i64, TestRequest>,
    flow_service: Arc<dyn TestRequestFlowService>,
}

impl InMemoryTestRequestStore {
    pub fn new(flow_service: Arc<dyn TestRequestFlowService>) -> Self {
        Self {
            requests: DashMap::new(),
            flow_service,
        }
    }

    /// Insert or replace a request, as the upstream intake and lab stages do
    pub fn insert(&self, request: TestRequest) {
        self.requests.insert(request.request_id, request);
    }

    pub fn get(&self, id: i64) -> Option<TestRequest> {
        self.requests.get(&id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Seed the store from a JSON array of test requests
    pub fn load_fixtures(&self, path: impl AsRef<Path>) -> anyhow::Result<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let requests: Vec<TestRequest> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

        let count = requests.len();
        for request in requests {
            self.insert(request);
        }
        info!(count, path = %path.display(), "Seeded test requests");
        Ok(count)
    }

    fn collect_sorted(&self, predicate: impl Fn(&TestRequest) -> bool) -> Vec<TestRequest> {
        let mut matches: Vec<TestRequest> = self
            .requests
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by_key(|r| r.request_id);
        matches
    }

    /// Log a committed transition. If the flow log refuses it, the entry is
    /// put back to `previous` unless someone has moved it on since.
    async fn record_transition(
        &self,
        previous: TestRequest,
        updated: TestRequest,
        from: RequestStatus,
        to: RequestStatus,
        doctor: &User,
    ) -> ServiceResult<TestRequest> {
        if let Err(err) = self.flow_service.log(&updated, from, to, doctor).await {
            if let Some(mut entry) = self.requests.get_mut(&updated.request_id) {
                if *entry == updated {
                    *entry = previous;
                }
            }
            warn!(
                test_request_id = updated.request_id,
                from = %from,
                to = %to,
                error = %err,
                "Flow log failed, transition rolled back"
            );
            return Err(err);
        }
        Ok(updated)
    }
}

fn invalid_id_or_state() -> ServiceError {
    ServiceError::Domain(INVALID_ID_OR_STATE.to_string())
}

#[async_trait]
impl TestRequestQueryService for InMemoryTestRequestStore {
    async fn find_by_status(&self, status: RequestStatus) -> ServiceResult<Vec<TestRequest>> {
        Ok(self.collect_sorted(|r| r.status == status))
    }

    async fn find_by_doctor(&self, doctor: &User) -> ServiceResult<Vec<TestRequest>> {
        Ok(self.collect_sorted(|r| r.is_assigned_to(doctor)))
    }
}

#[async_trait]
impl TestRequestUpdateService for InMemoryTestRequestStore {
    async fn assign_for_consultation(&self, id: i64, doctor: &User) -> ServiceResult<TestRequest> {
        let from = RequestStatus::LabTestCompleted;
        let to = RequestStatus::DiagnosisInProcess;

        // The entry guard must be released before awaiting the flow log
        let (previous, updated) = {
            let mut entry = self
                .requests
                .get_mut(&id)
                .filter(|r| r.status == from)
                .ok_or_else(|| {
                    debug!(test_request_id = id, "Assignment rejected");
                    invalid_id_or_state()
                })?;

            let request = entry.value_mut();
            let previous = request.clone();
            request.consultation = Some(Consultation::assigned_to(doctor.clone()));
            request.status = to;
            (previous, request.clone())
        };

        self.record_transition(previous, updated, from, to, doctor)
            .await
    }

    async fn update_consultation(
        &self,
        id: i64,
        input: ConsultationInput,
        doctor: &User,
    ) -> ServiceResult<TestRequest> {
        input.validate()?;

        let from = RequestStatus::DiagnosisInProcess;
        let to = RequestStatus::Completed;

        let (previous, updated) = {
            let mut entry = self
                .requests
                .get_mut(&id)
                .filter(|r| r.status == from)
                .ok_or_else(invalid_id_or_state)?;

            let request = entry.value_mut();
            let previous = request.clone();
            let consultation = match request.consultation.as_mut() {
                Some(c) if c.doctor.is_same_user(doctor) => c,
                _ => {
                    warn!(
                        test_request_id = id,
                        doctor_id = %doctor.id,
                        "Consultation update by unassigned doctor"
                    );
                    return Err(ServiceError::Forbidden(
                        "You are not assigned to this test request".to_string(),
                    ));
                }
            };

            consultation.suggestion = input.suggestion;
            consultation.comments = input.comments;
            consultation.updated_on = Some(Utc::now());
            request.status = to;
            (previous, request.clone())
        };

        self.record_transition(previous, updated, from, to, doctor)
            .await
    }
}
