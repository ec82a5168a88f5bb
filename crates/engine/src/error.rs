//! The module contains the errors the engine can return.
//!
//! None of them is fatal: validation errors are surfaced to the caller before
//! anything enters the ledger, and [`Storage`] failures leave the in-memory
//! trip exactly as it was before the call.
//!
//! Convergence problems in the planner and stale settled marks are not errors;
//! they are logged and reported through return values instead.
//!
//!  [`Storage`]: EngineError::Storage
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Participant in use: {0}")]
    ParticipantInUse(String),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    /// Returns `true` for failures the caller can retry after a rollback.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
