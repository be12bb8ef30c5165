//! Error types for the Promptwright store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every layer of the store.
///
/// Variants map onto three failure classes:
/// - *not found*: a referenced entity is missing or owned by a different parent
/// - *malformed input*: a top-level required field failed validation
/// - *engine failure*: the transaction could not run or could not commit
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Top-level input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transaction engine error (scope violation, read-only write, closed connection)
    #[error("Engine error: {0}")]
    Engine(String),

    /// The backing file is held by another process
    #[error("Store is locked by another process: {path}")]
    Locked { path: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Engine error
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is an engine-level failure.
    ///
    /// Engine failures are the retryable class: the operation had no effect.
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Self::Engine(_) | Self::Locked { .. } | Self::Io { .. } | Self::Serialization { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, StoreError>`.
pub type Result<T> = std::result::Result<T, StoreError>;
