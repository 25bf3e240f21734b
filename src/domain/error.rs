use thiserror::Error;

use crate::domain::account::{AccountConflict, AccountValidationError};

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(#[from] AccountValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] AccountConflict),

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    /// Carries no detail; the specific reason is only logged.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Internal consistency error: {message}")]
    InternalConsistency { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Operation '{operation}' timed out")]
    Timeout { operation: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    pub fn internal_consistency(message: impl Into<String>) -> Self {
        Self::InternalConsistency {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Dependency failures the caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Cache { .. } | Self::Timeout { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
