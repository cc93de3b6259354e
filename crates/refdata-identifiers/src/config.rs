//! Versioning configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or checking a [`VersioningConfig`].
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

/// Settings shared by the identifier managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Extra attempts after an optimistic-lock conflict.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Systems listed in every impact assessment.
    #[serde(default = "default_affected_systems")]
    pub affected_systems: Vec<String>,

    /// Identifier tags whose changes are at least MEDIUM risk.
    #[serde(default = "default_medium_risk_types")]
    pub medium_risk_types: Vec<String>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_affected_systems() -> Vec<String> {
    ["trading_system", "risk_management", "reporting"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_medium_risk_types() -> Vec<String> {
    vec!["TICKER".to_string(), "ISIN".to_string()]
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            affected_systems: default_affected_systems(),
            medium_risk_types: default_medium_risk_types(),
        }
    }
}

impl VersioningConfig {
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

    /// Whether changes to `tag` start at MEDIUM risk.
    pub fn is_medium_risk(&self, tag: &str) -> bool {
        self.medium_risk_types.iter().any(|t| t == tag)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.affected_systems.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation {
                field: "affected_systems".to_string(),
                message: "entries must not be blank".to_string(),
            });
        }
        if let Some(tag) = self
            .medium_risk_types
            .iter()
            .find(|t| t.is_empty() || **t != t.to_uppercase())
        {
            return Err(ConfigError::Validation {
                field: "medium_risk_types".to_string(),
                message: format!("tags must be non-empty upper case, got '{tag}'"),
            });
        }
        Ok(())
    }
}
