//! API error handling
//!
//! One user-facing error type with a stable machine-readable code per
//! variant. Every domain error maps onto it; cross-tenant access surfaces
//! as a plain 404 with no hint that the record exists elsewhere.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinicdesk_types::CoreError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error surface
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Prescription already exists for visit {0}")]
    PrescriptionAlreadyExists(String),

    #[error("Allocation temporarily unavailable for {0}")]
    SequenceExhausted(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::PrescriptionAlreadyExists(_) => "PRESCRIPTION_ALREADY_EXISTS",
            Self::SequenceExhausted(_) => "SEQUENCE_EXHAUSTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for the variant
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } | Self::PrescriptionAlreadyExists(_) => {
                StatusCode::CONFLICT
            }
            Self::SequenceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire format for errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub msg: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.error_code().to_string(),
            msg: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::from(&self);
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_operational_alert() {
            tracing::error!(error = %err, "allocation retry budget exhausted");
        }
        match err {
            CoreError::Unauthorized => Self::Unauthorized,
            CoreError::Forbidden { operation, role } => {
                Self::Forbidden(format!("role {role} may not {operation}"))
            }
            CoreError::NotFound { entity } => Self::NotFound(entity),
            CoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            CoreError::PrescriptionAlreadyExists { visit_id } => {
                Self::PrescriptionAlreadyExists(visit_id)
            }
            CoreError::SequenceExhausted { scope, .. } => Self::SequenceExhausted(scope),
            CoreError::Validation { field, reason } => {
                Self::Validation(format!("{field}: {reason}"))
            }
            CoreError::Internal { message } => {
                tracing::error!(error = %message, "internal error");
                Self::Internal
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.as_ref().map(|m| m.as_ref()).unwrap_or("invalid")
                    )
                })
            })
            .collect();
        Self::Validation(messages.join(", "))
    }
}
