// Consultation workflow services
// Gateway, collaborator contracts, in-memory store and audit log.

pub mod consultation_gateway;
pub mod flow_log;
pub mod login;
pub mod test_request_store;
pub mod traits;

pub use consultation_gateway::ConsultationGateway;
pub use flow_log::InMemoryFlowLog;
pub use login::ClaimsUserLoggedInService;
pub use test_request_store::InMemoryTestRequestStore;
pub use traits::{
    ServiceError, ServiceResult, TestRequestFlowService, TestRequestQueryService,
    TestRequestUpdateService, UserLoggedInService,
};
