//! Shared error types for the identity service

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Invalid link precedence: {value}")]
    InvalidPrecedence { value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
