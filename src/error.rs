//! Custom error types for chronicle
//!
//! This module defines the error hierarchy for the engine using thiserror.
//! Variants are grouped the way callers need to tell them apart: usage errors
//! (tracking sessions opened or closed incorrectly), policy violations
//! (versioned history being deleted or overwritten), resolution failures
//! (audit subject cannot be identified) and infrastructure failures.

use thiserror::Error;

use crate::tracking::TrackingState;

/// The main error type for chronicle operations
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A tracking session was ended that was never begun
    #[error("{entity_type} is not inside a tracking session")]
    UntrackedEntity { entity_type: &'static str },

    /// A tracking session of the other kind is active
    #[error("{entity_type} tracking session mismatch: expected {expected}, found {actual}")]
    SessionMismatch {
        entity_type: &'static str,
        expected: TrackingState,
        actual: TrackingState,
    },

    /// Versioned history cannot be deleted
    #[error("Deleting versioned {entity_type} '{identifier}' is not allowed")]
    VersionedDeleteRejected {
        entity_type: &'static str,
        identifier: String,
    },

    /// The audit subject has no identifier
    #[error("Cannot resolve an identifier for {entity_type}")]
    MissingIdentifier { entity_type: &'static str },

    /// A housekeeping field the entity type refuses to carry
    #[error("{entity_type} does not accept housekeeping field '{field}'")]
    HousekeepingRejected {
        entity_type: &'static str,
        field: &'static str,
    },

    /// Effective time outside the representable range
    #[error("Invalid effective time: {0}")]
    InvalidEffectiveTime(i64),

    /// Field name absent from the entity's registry
    #[error("{entity_type} has no field '{field}'")]
    UnknownField {
        entity_type: &'static str,
        field: String,
    },

    /// Field exists but exposes no setter
    #[error("{entity_type} field '{field}' is read-only")]
    ReadOnlyField {
        entity_type: &'static str,
        field: String,
    },

    /// Raw value could not be parsed for a field
    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ChronicleError {
    /// Create a "not found" error for a stored row
    pub fn row_not_found(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Create an "invalid value" error for a field setter
    pub fn invalid_value(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Caller misused a tracking session or the field registry
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::UntrackedEntity { .. }
                | Self::SessionMismatch { .. }
                | Self::UnknownField { .. }
                | Self::ReadOnlyField { .. }
                | Self::InvalidFieldValue { .. }
        )
    }

    /// Caller tried to break an immutability rule of versioned history
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::VersionedDeleteRejected { .. } | Self::HousekeepingRejected { .. }
        )
    }
}

impl From<std::io::Error> for ChronicleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChronicleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for chronicle operations
pub type ChronicleResult<T> = Result<T, ChronicleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChronicleError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = ChronicleError::row_not_found("Order", "42");
        assert_eq!(err.to_string(), "Order not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_session_mismatch_display() {
        let err = ChronicleError::SessionMismatch {
            entity_type: "Order",
            expected: TrackingState::Editing,
            actual: TrackingState::Creating,
        };
        assert_eq!(
            err.to_string(),
            "Order tracking session mismatch: expected EDITING, found CREATING"
        );
        assert!(err.is_usage_error());
        assert!(!err.is_policy_violation());
    }

    #[test]
    fn test_versioned_delete_is_policy_violation() {
        let err = ChronicleError::VersionedDeleteRejected {
            entity_type: "TaxRate",
            identifier: "VAT".into(),
        };
        assert!(err.is_policy_violation());
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChronicleError = io_err.into();
        assert!(matches!(err, ChronicleError::Io(_)));
    }
}
