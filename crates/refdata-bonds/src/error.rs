//! Error types for bond analytics.

use thiserror::Error;

use crate::config::ConfigError;

/// A specialized Result type for bond analytics.
pub type BondResult<T> = Result<T, BondError>;

/// Errors that can occur while building or evaluating a bond.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BondError {
    /// A bond record failed validation.
    #[error("Invalid bond parameters: {field}: {reason}")]
    InvalidBondParameters {
        /// The offending field.
        field: String,
        /// Description of what's invalid.
        reason: String,
    },

    /// Bond type tag outside the supported set.
    #[error("Unsupported bond type: {value}")]
    UnsupportedBondType {
        /// The tag that was not recognised.
        value: String,
    },

    /// A convention value with no mapping to a market primitive.
    #[error("Unsupported {kind}: {value}")]
    UnsupportedConvention {
        /// Which convention family (calendar, day count, ...).
        kind: &'static str,
        /// The unmapped value.
        value: String,
    },

    /// Rejected curve rate.
    #[error("Invalid rate: {reason}")]
    InvalidRate {
        /// Description of what's invalid.
        reason: String,
    },

    /// Root finding failed.
    #[error("Solver failed after {iterations} iterations: {reason}")]
    SolverFailure {
        /// Number of iterations attempted.
        iterations: u32,
        /// Description of the failure.
        reason: String,
    },

    /// Pricing calculation failed.
    #[error("Pricing failed: {reason}")]
    Pricing {
        /// Description of the failure.
        reason: String,
    },

    /// Analytics configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Core library error.
    #[error("Core error: {0}")]
    Core(#[from] refdata_core::CoreError),
}

impl BondError {
    /// Creates an invalid parameters error.
    #[must_use]
    pub fn invalid_parameters(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBondParameters {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported convention error.
    #[must_use]
    pub fn unsupported_convention(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedConvention {
            kind,
            value: value.into(),
        }
    }

    /// Creates an invalid rate error.
    #[must_use]
    pub fn invalid_rate(reason: impl Into<String>) -> Self {
        Self::InvalidRate {
            reason: reason.into(),
        }
    }

    /// Creates a solver failure error.
    #[must_use]
    pub fn solver_failure(iterations: u32, reason: impl Into<String>) -> Self {
        Self::SolverFailure {
            iterations,
            reason: reason.into(),
        }
    }

    /// Creates a pricing error.
    #[must_use]
    pub fn pricing(reason: impl Into<String>) -> Self {
        Self::Pricing {
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised by record validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidBondParameters { .. }
                | Self::UnsupportedBondType { .. }
                | Self::InvalidRate { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameters_message_names_field() {
        let err = BondError::invalid_parameters("face_value", "must be positive, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid bond parameters: face_value: must be positive, got -1"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_core_error_conversion() {
        let core = refdata_core::CoreError::invalid_rate("rate NaN is not finite");
        let err: BondError = core.into();
        assert!(matches!(err, BondError::Core(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_unsupported_convention_message() {
        let err = BondError::unsupported_convention("calendar", "JAPAN");
        assert_eq!(err.to_string(), "Unsupported calendar: JAPAN");
    }
}
