//! Errors of the hosting layer
//!
//! The calculator and the person registry never fail. These cover what sits
//! around them: session lookup, configuration and I/O.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BudgetError {
    /// A request referenced a session that was never created or has been torn down
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BudgetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BudgetError::SessionNotFound(_))
    }
}

/// Result type alias for host-layer operations
pub type AppResult<T> = Result<T, BudgetError>;
