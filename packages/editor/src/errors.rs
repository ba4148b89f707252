//! Error types for the editor

use thiserror::Error;

/// Failure of a single operation inside a batch.
///
/// These never abort a batch; the executor turns them into
/// [`OperationResult`](crate::OperationResult) entries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Malformed operation: {0}")]
    Malformed(String),

    #[error("Element not found")]
    NotFound,

    #[error("Element has no parent")]
    NoParent,

    #[error("{0}")]
    Dom(#[from] pagewright_dom::DomError),
}

impl MutationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        MutationError::Malformed(message.into())
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Could not capture document: {0}")]
    Capture(String),

    #[error("Token limit exceeded ({estimated} / {limit})")]
    TokenLimitExceeded { estimated: u64, limit: u64 },

    #[error("Invalid design response: {0}")]
    InvalidResponse(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session limit reached ({0})")]
    SessionLimit(usize),

    #[error("Cannot delete the last session")]
    LastSession,

    #[error("Turn not found: {0}")]
    TurnNotFound(usize),

    #[error("History item not found: {0}")]
    HistoryNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
