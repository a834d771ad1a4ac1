use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::current_request_id;
use crate::services::ServiceError;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    #[serde(rename = "AUTH_1002")]
    TokenExpired,
    #[serde(rename = "AUTH_1003")]
    TokenInvalid,
    #[serde(rename = "AUTH_1004")]
    TokenMissing,

    // Authorization errors (2xxx)
    #[serde(rename = "AUTHZ_2001")]
    InsufficientPermissions,
    #[serde(rename = "AUTHZ_2003")]
    RoleNotAuthorized,

    // Validation errors (3xxx)
    #[serde(rename = "VAL_3001")]
    InvalidInput,
    #[serde(rename = "VAL_3002")]
    MissingRequiredField,
    #[serde(rename = "VAL_3003")]
    InvalidFormat,
    #[serde(rename = "VAL_3009")]
    ConstraintViolation,

    // Business logic errors (5xxx)
    #[serde(rename = "BIZ_5007")]
    InvalidRequestState,

    // Internal errors (9xxx)
    #[serde(rename = "INT_9999")]
    InternalServerError,
    #[serde(rename = "INT_9998")]
    ConfigurationError,
}

impl ErrorCode {
    /// Get numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::TokenExpired => 1002,
            ErrorCode::TokenInvalid => 1003,
            ErrorCode::TokenMissing => 1004,

            ErrorCode::InsufficientPermissions => 2001,
            ErrorCode::RoleNotAuthorized => 2003,

            ErrorCode::InvalidInput => 3001,
            ErrorCode::MissingRequiredField => 3002,
            ErrorCode::InvalidFormat => 3003,
            ErrorCode::ConstraintViolation => 3009,

            ErrorCode::InvalidRequestState => 5007,

            ErrorCode::InternalServerError => 9999,
            ErrorCode::ConfigurationError => 9998,
        }
    }

    /// Get user-friendly message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::TokenExpired => "Your session has expired. Please log in again",
            ErrorCode::TokenInvalid => "Invalid authentication token",
            ErrorCode::TokenMissing => "Authentication required. Please log in",

            ErrorCode::InsufficientPermissions => {
                "You don't have permission to perform this action"
            }
            ErrorCode::RoleNotAuthorized => "Your role is not authorized for this action",

            ErrorCode::InvalidInput => "Invalid input provided",
            ErrorCode::MissingRequiredField => "Required field is missing",
            ErrorCode::InvalidFormat => "Invalid format provided",
            ErrorCode::ConstraintViolation => "Request failed field validation",

            ErrorCode::InvalidRequestState => "The test request cannot be processed in its current state",

            ErrorCode::InternalServerError => "An internal server error occurred",
            ErrorCode::ConfigurationError => "Server configuration error",
        }
    }
}

/// Structured error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub request_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub code_number: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<FieldViolation>>,
}

/// A single violated field constraint on a request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub constraint: String,
    pub message: String,
}

impl FieldViolation {
    /// Flatten `validator` errors into one entry per violated constraint,
    /// ordered by field name so responses are stable.
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Vec<Self> {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                let field = field.to_string();
                field_errors.iter().map(move |e| FieldViolation {
                    field: field.clone(),
                    constraint: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} failed the '{}' constraint", field, e.code)),
                })
            })
            .collect();

        violations.sort_by(|a, b| (&a.field, &a.constraint).cmp(&(&b.field, &b.constraint)));
        violations
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {}", join_violations(.0))]
    ConstraintViolation(Vec<FieldViolation>),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("{1}")]
    WithCode(ErrorCode, String),

    #[error("{1}")]
    WithCodeAndDetails(ErrorCode, String, String),

    #[error("Validation failed: {field}")]
    ValidationWithField {
        code: ErrorCode,
        field: String,
        message: String,
    },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    /// Create error with specific error code
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::WithCode(code, message.into())
    }

    /// Create error with code and additional details
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        ApiError::WithCodeAndDetails(code, message.into(), details.into())
    }

    /// Create validation error for specific field
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationWithField {
            code: ErrorCode::InvalidInput,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a constraint violation error listing every failed field
    pub fn constraint_violation(errors: &validator::ValidationErrors) -> Self {
        ApiError::ConstraintViolation(FieldViolation::from_validation_errors(errors))
    }

    /// Get error code
    fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::InvalidRequestState,
            ApiError::Unauthorized(_) => ErrorCode::TokenMissing,
            ApiError::Forbidden(_) => ErrorCode::InsufficientPermissions,
            ApiError::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            ApiError::Configuration(_) => ErrorCode::ConfigurationError,
            ApiError::Internal(_) => ErrorCode::InternalServerError,
            ApiError::WithCode(code, _) => *code,
            ApiError::WithCodeAndDetails(code, _, _) => *code,
            ApiError::ValidationWithField { code, .. } => *code,
        }
    }

    /// Get status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_)
            | ApiError::WithCode(ErrorCode::TokenExpired, _)
            | ApiError::WithCode(ErrorCode::TokenInvalid, _)
            | ApiError::WithCode(ErrorCode::TokenMissing, _) => StatusCode::UNAUTHORIZED,

            ApiError::Forbidden(_)
            | ApiError::WithCode(ErrorCode::InsufficientPermissions, _)
            | ApiError::WithCode(ErrorCode::RoleNotAuthorized, _) => StatusCode::FORBIDDEN,

            ApiError::BadRequest(_)
            | ApiError::ConstraintViolation(_)
            | ApiError::ValidationWithField { .. }
            | ApiError::WithCode(ErrorCode::InvalidInput, _)
            | ApiError::WithCode(ErrorCode::MissingRequiredField, _)
            | ApiError::WithCode(ErrorCode::InvalidFormat, _)
            | ApiError::WithCodeAndDetails(ErrorCode::InvalidInput, _, _)
            | ApiError::WithCodeAndDetails(ErrorCode::InvalidFormat, _, _) => {
                StatusCode::BAD_REQUEST
            }

            ApiError::Configuration(_)
            | ApiError::Internal(_)
            | ApiError::WithCode(_, _)
            | ApiError::WithCodeAndDetails(_, _, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Client errors keep the original text,
    /// server errors fall back to the generic code message.
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::WithCode(_, msg)
            | ApiError::WithCodeAndDetails(_, msg, _) => msg.clone(),
            ApiError::ValidationWithField { message, .. } => message.clone(),
            ApiError::ConstraintViolation(violations) => {
                format!("Validation failed: {}", join_violations(violations))
            }
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                self.error_code().message().to_string()
            }
        }
    }

    fn error_details(&self) -> Option<String> {
        match self {
            ApiError::WithCodeAndDetails(_, _, details) => Some(details.clone()),
            _ => None,
        }
    }

    fn error_field(&self) -> Option<String> {
        match self {
            ApiError::ValidationWithField { field, .. } => Some(field.clone()),
            _ => None,
        }
    }

    fn violations(&self) -> Option<Vec<FieldViolation>> {
        match self {
            ApiError::ConstraintViolation(violations) => Some(violations.clone()),
            _ => None,
        }
    }

    /// Log error with appropriate level
    fn log_error(&self, request_id: &str) {
        match self.status_code() {
            status if status.is_server_error() => {
                error!(
                    request_id = %request_id,
                    error = %self,
                    "Server error occurred"
                );
            }
            status if status.is_client_error() => {
                warn!(
                    request_id = %request_id,
                    error = %self,
                    "Client error occurred"
                );
            }
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        let status = self.status_code();
        let code = self.error_code();

        self.log_error(&request_id);

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code,
                code_number: code.code(),
                message: self.public_message(),
                details: self.error_details(),
                field: self.error_field(),
                violations: self.violations(),
            },
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Collaborator failures at the HTTP boundary. Domain and validation errors
/// become client-request errors; everything else keeps its own status.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(message) => ApiError::BadRequest(message),
            ServiceError::Validation(errors) => ApiError::constraint_violation(&errors),
            ServiceError::Forbidden(message) => ApiError::Forbidden(message),
            ServiceError::Unauthenticated(message) => ApiError::Unauthorized(message),
            ServiceError::Internal(message) => ApiError::Internal(message),
        }
    }
}

/// Handle Axum JSON rejections and convert to structured API errors
impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        match err {
            JsonRejection::JsonDataError(e) => {
                let body_text = e.body_text();
                match extract_missing_field(&body_text) {
                    Some(field) => ApiError::ValidationWithField {
                        code: ErrorCode::MissingRequiredField,
                        message: format!("Required field '{}' is missing", field),
                        field,
                    },
                    None => ApiError::with_details(
                        ErrorCode::InvalidInput,
                        "Invalid input provided",
                        body_text,
                    ),
                }
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::with_code(ErrorCode::InvalidFormat, "Invalid JSON format")
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::with_code(ErrorCode::InvalidFormat, "JSON content type required")
            }
            JsonRejection::BytesRejection(_) => {
                ApiError::with_code(ErrorCode::InvalidInput, "Invalid request body format")
            }
            other => ApiError::with_details(
                ErrorCode::InvalidInput,
                "Invalid input provided",
                other.body_text(),
            ),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::validation_field("id", format!("Invalid test request id: {}", err.body_text()))
    }
}

/// Extract missing field name from "missing field `field_name`" error message
fn extract_missing_field(error_msg: &str) -> Option<String> {
    let start = error_msg.find("missing field `")? + "missing field `".len();
    let end = error_msg[start..].find('`')?;
    Some(error_msg[start..start + end].to_string())
}
