//! Configuration Error Types
//!
//! Errors raised while loading and validating balancer configuration. They are
//! folded into `BalancerError::InvalidConfig` at the crate boundary.

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Missing required configuration field
    #[error("Missing required configuration field '{field}' in {context}")]
    MissingRequiredField { field: String, context: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// Explicitly requested configuration file does not exist
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Source layering or deserialization failure reported by the `config` crate
    #[error("Failed to load configuration: {0}")]
    LoadError(String),
}

impl ConfigurationError {
    /// Create a missing required field error
    pub fn missing_required_field<F: Into<String>, C: Into<String>>(field: F, context: C) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        ConfigurationError::LoadError(error.to_string())
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
