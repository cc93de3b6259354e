//! Error types for identifier management.

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::types::{EntityId, RequestStatus};

/// A specialized Result type for identifier operations.
pub type IdentifierResult<T> = Result<T, IdentifierError>;

/// Errors raised by the identifier managers.
#[derive(Error, Debug)]
pub enum IdentifierError {
    /// A value failed its type's format rules.
    #[error("Invalid identifier format for {identifier_type} '{value}': {}", .errors.join("; "))]
    InvalidFormat {
        /// Identifier type tag.
        identifier_type: String,
        /// The normalized value.
        value: String,
        /// Validation messages.
        errors: Vec<String>,
    },

    /// A change request was reviewed outside the pending state.
    #[error("Change request {id} is not pending. Current status: {status}")]
    InvalidRequestState {
        /// Request id.
        id: Uuid,
        /// Status found.
        status: RequestStatus,
    },

    /// No change request with this id.
    #[error("Change request {id} not found")]
    ChangeRequestNotFound {
        /// Request id.
        id: Uuid,
    },

    /// No history row with this version.
    #[error("Version {version} of {identifier_type} not found for entity {entity_id}")]
    VersionNotFound {
        /// Entity key.
        entity_id: EntityId,
        /// Identifier type tag.
        identifier_type: String,
        /// Requested version.
        version: u32,
    },

    /// A concurrent writer changed the guarded rows and retries ran out.
    #[error("Version conflict on '{key}': expected {expected}, found {actual}")]
    VersionConflict {
        /// The guarded key.
        key: String,
        /// What the writer read.
        expected: String,
        /// What the store held.
        actual: String,
    },

    /// Identifier type tag outside the supported set.
    #[error("Unsupported identifier type: {value}")]
    UnsupportedIdentifierType {
        /// The tag that was not recognised.
        value: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl IdentifierError {
    /// Creates an unsupported identifier type error.
    #[must_use]
    pub fn unsupported_type(value: impl Into<String>) -> Self {
        Self::UnsupportedIdentifierType {
            value: value.into(),
        }
    }

    /// Creates a version-not-found error.
    #[must_use]
    pub fn version_not_found(
        entity_id: EntityId,
        identifier_type: impl Into<String>,
        version: u32,
    ) -> Self {
        Self::VersionNotFound {
            entity_id,
            identifier_type: identifier_type.into(),
            version,
        }
    }

    /// Whether retrying the operation could succeed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

impl From<StoreError> for IdentifierError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict {
                key,
                expected,
                actual,
            } => Self::VersionConflict {
                key,
                expected,
                actual,
            },
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_version_conflict() {
        let err: IdentifierError = StoreError::conflict("42:TICKER", "v1", "v2").into();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Version conflict on '42:TICKER': expected v1, found v2");
    }

    #[test]
    fn test_other_store_errors_wrap() {
        let err: IdentifierError = StoreError::Database("disk full".into()).into();
        assert!(matches!(err, IdentifierError::Storage(StoreError::Database(_))));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_invalid_format_message() {
        let err = IdentifierError::InvalidFormat {
            identifier_type: "ISIN".into(),
            value: "XX".into(),
            errors: vec!["Invalid ISIN format".into()],
        };
        assert_eq!(
            err.to_string(),
            "Invalid identifier format for ISIN 'XX': Invalid ISIN format"
        );
    }
}
