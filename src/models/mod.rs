// Data models and DTOs for the consultation workflow

pub mod test_request;
pub mod user;

pub use test_request::{
    Consultation, ConsultationInput, DoctorSuggestion, RequestStatus, TestRequest,
    TestRequestFlow,
};
pub use user::User;
