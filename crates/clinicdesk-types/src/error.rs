//! Error types for ClinicDesk
//!
//! All errors from the core are terminal for the triggering request; the
//! API layer maps each variant to a user-facing status. Cross-tenant access
//! is deliberately collapsed into `NotFound` so callers cannot probe for
//! the existence of other clinics' records.

use thiserror::Error;

/// Result type for ClinicDesk core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// ClinicDesk core error taxonomy
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// No identity resolved for the request
    #[error("Unauthorized")]
    Unauthorized,

    /// Identity present, role insufficient for the operation
    #[error("Forbidden: role {role} may not {operation}")]
    Forbidden { operation: String, role: String },

    /// Entity absent, or owned by another clinic (indistinguishable)
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// Lifecycle guard violated
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A prescription already exists for the visit
    #[error("Prescription already exists for visit {visit_id}")]
    PrescriptionAlreadyExists { visit_id: String },

    /// Allocator retry budget exceeded; signals contention or a bug
    #[error("Sequence exhausted for scope {scope} after {attempts} attempts")]
    SequenceExhausted { scope: String, attempts: u32 },

    /// Malformed input
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Create a not-found error for an entity kind
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(operation: impl Into<String>, role: impl Into<String>) -> Self {
        Self::Forbidden {
            operation: operation.into(),
            role: role.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error indicates allocator contention worth alerting on
    pub fn is_operational_alert(&self) -> bool {
        matches!(self, Self::SequenceExhausted { .. })
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::PrescriptionAlreadyExists { .. } => "PRESCRIPTION_ALREADY_EXISTS",
            Self::SequenceExhausted { .. } => "SEQUENCE_EXHAUSTED",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CoreError::InvalidTransition {
            from: "completed".to_string(),
            to: "waiting".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(CoreError::Unauthorized.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_operational_alert() {
        let exhausted = CoreError::SequenceExhausted {
            scope: "clinic_x/2026-08-23".to_string(),
            attempts: 5,
        };
        assert!(exhausted.is_operational_alert());
        assert!(!CoreError::not_found("visit").is_operational_alert());
    }

    #[test]
    fn test_not_found_hides_tenancy() {
        // The same variant serves "absent" and "owned by another clinic"
        let err = CoreError::not_found("receipt");
        assert_eq!(err.to_string(), "receipt not found");
    }
}
