//! In-memory audit trail of test request status transitions.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::models::{RequestStatus, TestRequest, TestRequestFlow, User};
use crate::services::traits::{ServiceResult, TestRequestFlowService};

#[derive(Default)]
pub struct InMemoryFlowLog {
    flows: DashMap<i64, Vec<TestRequestFlow>>,
}

impl InMemoryFlowLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TestRequestFlowService for InMemoryFlowLog {
    async fn log(
        &self,
        request: &TestRequest,
        from: RequestStatus,
        to: RequestStatus,
        changed_by: &User,
    ) -> ServiceResult<TestRequestFlow> {
        let flow = TestRequestFlow {
            id: Uuid::new_v4(),
            request_id: request.request_id,
            from_status: from,
            to_status: to,
            changed_by: changed_by.clone(),
            happened_at: Utc::now(),
        };

        info!(
            test_request_id = request.request_id,
            from = %from,
            to = %to,
            changed_by = %changed_by.id,
            "Test request status changed"
        );

        self.flows
            .entry(request.request_id)
            .or_default()
            .push(flow.clone());
        Ok(flow)
    }

    async fn find_by_request(&self, request_id: i64) -> ServiceResult<Vec<TestRequestFlow>> {
        Ok(self
            .flows
            .get(&request_id)
            .map(|flows| flows.value().clone())
            .unwrap_or_default())
    }
}
