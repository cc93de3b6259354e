//! Analytics configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curves::DEFAULT_KEY_TENORS;
use crate::pricing::SolverConfig;

/// Errors raised while loading or checking an [`AnalyticsConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value is out of range.
    #[error("{field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// Description of what's invalid.
        message: String,
    },

    /// TOML could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The file could not be read.
    #[error("io error: {0}")]
    Io(String),
}

impl ConfigError {
    fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Numeric settings shared by every analytics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Flat curve rate used until `update_yield_curve` is called.
    #[serde(default = "default_initial_rate")]
    pub initial_rate: f64,

    /// Yield bump for DV01 and key-rate durations.
    #[serde(default = "default_bump")]
    pub bump: f64,

    /// Yield solver tolerance.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Yield solver iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Points sampled by `get_discount_curve` when none are given.
    #[serde(default = "default_curve_points")]
    pub curve_points: usize,

    /// Hull-White tree steps.
    #[serde(default = "default_tree_steps")]
    pub tree_steps: usize,

    /// Hull-White mean reversion.
    #[serde(default = "default_hw_mean_reversion")]
    pub hw_mean_reversion: f64,

    /// Hull-White short rate volatility.
    #[serde(default = "default_hw_volatility")]
    pub hw_volatility: f64,

    /// Key-rate tenors in years.
    #[serde(default = "default_key_rate_tenors")]
    pub key_rate_tenors: Vec<f64>,
}

fn default_initial_rate() -> f64 {
    0.05
}

fn default_bump() -> f64 {
    1e-4
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> u32 {
    100
}

fn default_curve_points() -> usize {
    20
}

fn default_tree_steps() -> usize {
    100
}

fn default_hw_mean_reversion() -> f64 {
    0.03
}

fn default_hw_volatility() -> f64 {
    0.01
}

fn default_key_rate_tenors() -> Vec<f64> {
    DEFAULT_KEY_TENORS.to_vec()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            initial_rate: default_initial_rate(),
            bump: default_bump(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            curve_points: default_curve_points(),
            tree_steps: default_tree_steps(),
            hw_mean_reversion: default_hw_mean_reversion(),
            hw_volatility: default_hw_volatility(),
            key_rate_tenors: default_key_rate_tenors(),
        }
    }
}

impl AnalyticsConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Solver settings derived from this configuration.
    #[must_use]
    pub fn solver(&self) -> SolverConfig {
        SolverConfig::new(self.tolerance, self.max_iterations)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_rate.is_finite() && self.initial_rate >= 0.0) {
            return Err(ConfigError::validation(
                "initial_rate",
                format!("must be a non-negative number, got {}", self.initial_rate),
            ));
        }
        if !(self.bump.is_finite() && self.bump > 0.0) {
            return Err(ConfigError::validation(
                "bump",
                format!("must be positive, got {}", self.bump),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::validation(
                "tolerance",
                format!("must be positive, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::validation("max_iterations", "must be at least 1"));
        }
        if self.curve_points < 2 {
            return Err(ConfigError::validation(
                "curve_points",
                format!("must be at least 2, got {}", self.curve_points),
            ));
        }
        if self.tree_steps == 0 {
            return Err(ConfigError::validation("tree_steps", "must be at least 1"));
        }
        if !(self.hw_volatility.is_finite() && self.hw_volatility >= 0.0) {
            return Err(ConfigError::validation(
                "hw_volatility",
                format!("must be non-negative, got {}", self.hw_volatility),
            ));
        }
        if !self.hw_mean_reversion.is_finite() {
            return Err(ConfigError::validation("hw_mean_reversion", "must be finite"));
        }
        if let Some(tenor) = self.key_rate_tenors.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
            return Err(ConfigError::validation(
                "key_rate_tenors",
                format!("tenors must be positive, got {tenor}"),
            ));
        }
        if self.key_rate_tenors.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::validation(
                "key_rate_tenors",
                "tenors must be strictly increasing",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.curve_points, 20);
        assert_eq!(config.key_rate_tenors.len(), DEFAULT_KEY_TENORS.len());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnalyticsConfig::from_toml_str("initial_rate = 0.03\ntree_steps = 50\n").unwrap();
        assert!((config.initial_rate - 0.03).abs() < 1e-15);
        assert_eq!(config.tree_steps, 50);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_validation_names_field() {
        let err = AnalyticsConfig::from_toml_str("bump = -0.0001").unwrap_err();
        assert_eq!(
            err,
            ConfigError::Validation {
                field: "bump".to_string(),
                message: "must be positive, got -0.0001".to_string(),
            }
        );
    }

    #[test]
    fn test_unsorted_tenors_rejected() {
        let err = AnalyticsConfig::from_toml_str("key_rate_tenors = [5.0, 2.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "key_rate_tenors"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            AnalyticsConfig::from_toml_str("initial_rate = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AnalyticsConfig::from_file("/nonexistent/refdata-analytics.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
