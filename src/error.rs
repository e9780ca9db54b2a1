//! Error taxonomy for the escalation workflow
//!
//! `DeskError` is what callers of the desk see. Validation, not-found and
//! already-resolved are ordinary outcomes; `Storage` is fatal and always
//! propagated. Oracle failures never appear here, the oracle adapter turns
//! them into the unknown signal.

use thiserror::Error;

/// Errors surfaced by the question/resolution workflow
#[derive(Debug, Error)]
pub enum DeskError {
    /// Missing or blank question/answer text
    #[error("validation failed: {0}")]
    Validation(String),

    /// No help request with this id exists
    #[error("help request not found: {id}")]
    NotFound { id: String },

    /// The help request was already answered by a supervisor
    #[error("help request already resolved: {id}")]
    AlreadyResolved { id: String },

    /// Durable storage failed
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl DeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        DeskError::Validation(message.into())
    }

    /// True for outcomes a caller is expected to handle (bad input, stale id)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DeskError::Storage(_))
    }
}

/// Failures raised by a `Storage` backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be decoded back into a record
    #[error("corrupt record in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

pub type DeskResult<T> = std::result::Result<T, DeskError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
