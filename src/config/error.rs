//! Configuration Error Types
//!
//! Specific, actionable error messages for configuration loading and validation.
//! Any of these is fatal at startup: the consumer never enters its loop with a
//! configuration it could not validate.

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing required configuration field
    #[error("Missing required configuration field '{field}': {hint}")]
    MissingRequiredField { field: String, hint: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// Engine configuration is not a usable JSON document
    #[error("Engine configuration is not valid JSON: {error}")]
    InvalidEngineConfiguration { error: String },

    /// No engine can be built for the requested mode
    #[error("No entity resolution engine available: {hint}")]
    EngineUnavailable { hint: String },

    /// Layered source could not be read or deserialized
    #[error("Failed to load configuration: {error}")]
    Load { error: String },
}

impl ConfigurationError {
    /// Create a missing required field error
    pub fn missing_required_field(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }

    /// Create an engine unavailable error
    pub fn engine_unavailable(hint: impl Into<String>) -> Self {
        Self::EngineUnavailable { hint: hint.into() }
    }

    /// Create an invalid engine configuration error
    pub fn invalid_engine_configuration(error: impl Into<String>) -> Self {
        Self::InvalidEngineConfiguration {
            error: error.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load {
            error: err.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigurationError>;
