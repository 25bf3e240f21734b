//! API error envelope and domain error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error categories exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    ConflictError,
    AuthenticationError,
    NotFoundError,
    ServerError,
    ServiceUnavailableError,
    TimeoutError,
}

impl ApiErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequestError => "invalid_request_error",
            Self::ConflictError => "conflict_error",
            Self::AuthenticationError => "authentication_error",
            Self::NotFoundError => "not_found_error",
            Self::ServerError => "server_error",
            Self::ServiceUnavailableError => "service_unavailable_error",
            Self::TimeoutError => "timeout_error",
        }
    }

    /// Status used when the error is not built with an explicit one
    pub fn default_status(self) -> StatusCode {
        match self {
            Self::InvalidRequestError => StatusCode::BAD_REQUEST,
            Self::ConflictError => StatusCode::CONFLICT,
            Self::AuthenticationError => StatusCode::UNAUTHORIZED,
            Self::NotFoundError => StatusCode::NOT_FOUND,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailableError => StatusCode::SERVICE_UNAVAILABLE,
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug, thiserror::Error)]
#[error("{}: {}", .response.error.error_type, .response.error.message)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                },
            },
        }
    }

    /// Name the offending request field
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    fn of(error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self::new(error_type.default_status(), error_type, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::InvalidRequestError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::ConflictError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::AuthenticationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::NotFoundError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::ServerError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::ServiceUnavailableError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of(ApiErrorType::TimeoutError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation(violation) => Self::bad_request(violation.to_string())
                .with_param(violation.field())
                .with_code("validation_error"),
            DomainError::Conflict(conflict) => Self::conflict(conflict.to_string())
                .with_param(conflict.field())
                .with_code("already_exists"),
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Precondition { message } => {
                Self::bad_request(message).with_code("precondition_failed")
            }
            DomainError::AuthenticationFailed => Self::unauthorized("Authentication failed"),
            DomainError::Storage { .. } | DomainError::Cache { .. } => {
                tracing::error!(error = %err, "Dependency failure");
                Self::unavailable("Service temporarily unavailable").with_code("dependency_error")
            }
            DomainError::Timeout { .. } => {
                tracing::error!(error = %err, "Dependency timed out");
                Self::timeout("Request timed out")
            }
            DomainError::InternalConsistency { .. }
            | DomainError::Configuration { .. }
            | DomainError::Internal { .. } => {
                tracing::error!(error = %err, "Internal failure");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountConflict, AccountValidationError};

    #[test]
    fn test_validation_error_names_field() {
        let api_err: ApiError =
            DomainError::from(AccountValidationError::UsernameContainsSpace).into();

        assert_eq!(api_err.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_err.response.error.param.as_deref(), Some("username"));
        assert_eq!(api_err.response.error.message, "Username cannot contain spaces");
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let api_err: ApiError = DomainError::from(AccountConflict::EmailAlreadyExists).into();

        assert_eq!(api_err.status, StatusCode::CONFLICT);
        assert_eq!(api_err.response.error.error_type, ApiErrorType::ConflictError);
        assert_eq!(api_err.response.error.param.as_deref(), Some("email"));
    }

    #[test]
    fn test_dependency_errors_hide_detail() {
        let api_err: ApiError = DomainError::storage("password=hunter2 host=db").into();

        assert_eq!(api_err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!api_err.response.error.message.contains("hunter2"));
    }

    #[test]
    fn test_internal_consistency_is_generic() {
        let api_err: ApiError = DomainError::internal_consistency("2 accounts share a username").into();

        assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.response.error.message, "Internal server error");
    }

    #[test]
    fn test_status_codes() {
        let cases: Vec<(DomainError, StatusCode)> = vec![
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::precondition("x"), StatusCode::BAD_REQUEST),
            (DomainError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (DomainError::cache("x"), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::timeout("x"), StatusCode::GATEWAY_TIMEOUT),
            (DomainError::configuration("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::unauthorized("Authentication failed");
        let json = serde_json::to_string(&err.response).unwrap();

        assert!(json.contains("authentication_error"));
        assert!(!json.contains("param"));
    }

    #[test]
    fn test_display_names_type_and_message() {
        let err = ApiError::timeout("Request timed out");

        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.to_string(), "timeout_error: Request timed out");
    }
}
