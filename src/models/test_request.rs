use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::User;

/// Lifecycle status of a test request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Initiated,
    LabTestInProgress,
    LabTestCompleted,
    DiagnosisInProcess,
    Completed,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::Initiated => "INITIATED",
            RequestStatus::LabTestInProgress => "LAB_TEST_IN_PROGRESS",
            RequestStatus::LabTestCompleted => "LAB_TEST_COMPLETED",
            RequestStatus::DiagnosisInProcess => "DIAGNOSIS_IN_PROCESS",
            RequestStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", s)
    }
}

/// A doctor's recommendation after reviewing the lab result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoctorSuggestion {
    NoIssues,
    HomeQuarantine,
    Admit,
}

/// Consultation attached to a test request once a doctor claims it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Consultation {
    pub doctor: User,
    pub suggestion: Option<DoctorSuggestion>,
    pub comments: Option<String>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Consultation {
    pub fn assigned_to(doctor: User) -> Self {
        Self {
            doctor,
            suggestion: None,
            comments: None,
            updated_on: None,
        }
    }
}

/// One patient's journey from test request through lab test to consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestRequest {
    pub request_id: i64,
    pub name: String,
    pub gender: String,
    pub age: u32,
    pub email: String,
    pub phone_number: String,
    pub pin_code: u32,
    pub address: String,
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(default)]
    pub consultation: Option<Consultation>,
}

impl TestRequest {
    /// The doctor this request is assigned to, if any.
    pub fn assigned_doctor(&self) -> Option<&User> {
        self.consultation.as_ref().map(|c| &c.doctor)
    }

    pub fn is_assigned_to(&self, doctor: &User) -> bool {
        self.assigned_doctor()
            .is_some_and(|assigned| assigned.is_same_user(doctor))
    }
}

/// Doctor's findings submitted for a test request under consultation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct ConsultationInput {
    #[validate(required(message = "suggestion must not be null"))]
    pub suggestion: Option<DoctorSuggestion>,

    #[validate(
        required(message = "comments must not be null"),
        length(min = 1, max = 1000, message = "comments must be between 1 and 1000 characters")
    )]
    pub comments: Option<String>,
}

/// Audit record of one status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestRequestFlow {
    pub id: Uuid,
    pub request_id: i64,
    pub from_status: RequestStatus,
    pub to_status: RequestStatus,
    pub changed_by: User,
    pub happened_at: DateTime<Utc>,
}
