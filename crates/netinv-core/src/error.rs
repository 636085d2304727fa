//! Error types for inventory operations.
//!
//! The four reconciliation kinds map onto how a caller reacts:
//!
//! | Kind | Meaning | Caller reaction |
//! |------|---------|-----------------|
//! | [`Validation`](InventoryError::Validation) | bad or missing input | fix the request |
//! | [`User`](InventoryError::User) | conflicts with deliberate/manual state | operator decision |
//! | [`NotFound`](InventoryError::NotFound) | referenced entity is missing | refresh and retry |
//! | [`Storage`](InventoryError::Storage) | persistence failure | retry later |

use netinv_types::ParseError;
use thiserror::Error;

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Required input is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation conflicts with an existing, deliberate state.
    #[error("{0}")]
    User(String),

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (e.g. "Interface", "Device").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The storage layer rejected or failed the operation.
    #[error("Storage error: {operation}: {message}")]
    Storage {
        /// The operation that failed (e.g. "insert_ipblock").
        operation: String,
        /// Error message.
        message: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Primitive parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InventoryError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a user (conflict) error.
    pub fn user(message: impl Into<String>) -> Self {
        Self::User(message.into())
    }

    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a storage error.
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the request itself rather than the
    /// environment; these are never worth retrying.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            InventoryError::Validation(_) | InventoryError::User(_) | InventoryError::Parse(_)
        )
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Storage { .. } | InventoryError::Io(_))
    }
}
