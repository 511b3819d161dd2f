//! Recoverable error taxonomy shared by every core operation.

use thiserror::Error;

/// Unified error type for trajectory operations.
///
/// Every variant is recoverable and carries a human-readable reason; the
/// caller decides user-facing messaging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Unknown id, or a traversal with no matching branch.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation exists but the current state does not admit it.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Malformed input value, e.g. a non-numeric answer to a scale question.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl EngineError {
    /// Create a not found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this is a missing-id or missing-branch error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
