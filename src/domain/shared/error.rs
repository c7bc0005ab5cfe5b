//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Short machine-readable tag, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidStateTransition(_) => "invalid_state_transition",
            DomainError::InvalidOperation(_) => "invalid_operation",
            DomainError::NotFound(_) => "not_found",
            DomainError::ValidationError(_) => "validation",
            DomainError::Conflict(_) => "conflict",
            DomainError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::NotFound("call 42".to_string());
        assert_eq!(err.to_string(), "Entity not found: call 42");
        assert_eq!(err.kind(), "not_found");
    }
}
