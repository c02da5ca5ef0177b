//! Reconciler-specific error types

use thiserror::Error;
use shared::{ContactId, SharedError};

#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Inconsistent cluster: {reason}")]
    InconsistentCluster { reason: String },

    #[error("Contact store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Contact not found: {id}")]
    ContactNotFound { id: ContactId },

    #[error("Transaction already finished")]
    TransactionClosed,
}

impl ReconcilerError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable { message: message.into() }
    }

    /// Errors caused by the caller rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidSubmission { .. })
    }
}

impl From<SharedError> for ReconcilerError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::InvalidSubmission { reason } => Self::InvalidSubmission { reason },
            // A stored row the model cannot represent is a data defect
            SharedError::InvalidPrecedence { value } => Self::InconsistentCluster {
                reason: format!("stored link precedence {value:?} is not recognised"),
            },
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for ReconcilerError {
    fn from(err: sqlx::Error) -> Self {
        Self::store(err.to_string())
    }
}

pub type ReconcilerResult<T> = Result<T, ReconcilerError>;
