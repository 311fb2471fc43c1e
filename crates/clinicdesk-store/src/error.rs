//! Store error types

use thiserror::Error;

/// Store operation errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique index rejected the write
    #[error("Duplicate key in {index}: {key}")]
    Duplicate { index: String, key: String },

    /// Document absent, or owned by another clinic
    #[error("Not found: {entity}")]
    NotFound { entity: String },
}

impl StoreError {
    pub fn duplicate(index: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Duplicate {
            index: index.into(),
            key: key.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Whether a caller holding an allocation retry budget should retry
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

impl From<StoreError> for clinicdesk_types::CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => Self::NotFound { entity },
            // Duplicates are normally consumed by retry loops; one escaping
            // to the caller is a logic error, not user error.
            StoreError::Duplicate { index, key } => Self::Internal {
                message: format!("unexpected duplicate key in {index}: {key}"),
            },
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
