//! Structured error responses for the inference API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use readmit_classifiers::ReadmitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    ModelsNotLoaded,
    RequestValidationError,
    SchemaMismatch,
    InternalError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelsNotLoaded => write!(f, "models_not_loaded"),
            Self::RequestValidationError => write!(f, "request_validation_error"),
            Self::SchemaMismatch => write!(f, "schema_mismatch"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// `{"error": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    pub message: String,
    /// Offending request field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// API error with status code
#[derive(Debug)]
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
                    error_type,
                    message: message.into(),
                    field: None,
                },
            },
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.response.error.field = Some(field.into());
        self
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorType::RequestValidationError,
            message,
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ModelsNotLoaded,
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorType::InternalError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<ReadmitError> for ApiError {
    fn from(err: ReadmitError) -> Self {
        match &err {
            ReadmitError::ModelsNotLoaded(reason) => Self::unavailable(format!(
                "Models not loaded ({}). Run `readmit train` first to generate the models.",
                reason
            )),
            ReadmitError::RequestValidation { field, .. } => {
                Self::unprocessable(err.to_string()).with_field(field.clone())
            }
            ReadmitError::SchemaMismatch { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorType::SchemaMismatch,
                err.to_string(),
            ),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}
