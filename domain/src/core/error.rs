//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Evidence status changes outside DRAFT → VERIFIED / QUARANTINE → STALE → ARCHIVED
    #[error("Invalid evidence transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let error = DomainError::InvalidTransition {
            from: "QUARANTINE".to_string(),
            to: "VERIFIED".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid evidence transition: QUARANTINE -> VERIFIED"
        );
    }
}
