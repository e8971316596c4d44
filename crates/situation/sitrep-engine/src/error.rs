//! Error types for the situational engine.
//!
//! Every validation failure is raised at the boundary where raw data enters
//! the engine (ingestion, assembly, configuration loading). Values that made it
//! past the boundary are consistent and are not re-validated downstream.

use std::fmt;
use thiserror::Error;

/// Errors produced by the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unrecognized severity/priority label
    #[error("Invalid tier: {0:?}")]
    InvalidTier(String),

    /// Non-positive estimate, negative count, out-of-range measurement
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Message is missing a required field or carries an unusable value
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Status change that moves backward in the message lifecycle
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Label outside one of the closed enumerated sets (hazard, status, component)
    #[error("Invalid {field} label: {value:?}")]
    InvalidLabel {
        /// Which field carried the label
        field: &'static str,
        /// The rejected label
        value: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Create a new invalid quantity error
    pub fn quantity<T: fmt::Display>(msg: T) -> Self {
        Self::InvalidQuantity(msg.to_string())
    }

    /// Create a new invalid message error
    pub fn message<T: fmt::Display>(msg: T) -> Self {
        Self::InvalidMessage(msg.to_string())
    }

    /// Create a new invalid label error
    pub fn label<T: fmt::Display>(field: &'static str, value: T) -> Self {
        Self::InvalidLabel {
            field,
            value: value.to_string(),
        }
    }

    /// Create a new transition error
    pub fn transition<A: fmt::Display, B: fmt::Display>(from: A, to: B) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Whether the error was caused by malformed upstream data
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err)
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML: {err}"))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
