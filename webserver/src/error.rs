//! WebServer-specific error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reconciler::ReconcilerError;
use shared::{ProcessId, process_error};
use thiserror::Error;

use crate::types::ErrorBody;

/// Message returned for every failure that is not the caller's fault
pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected system malfunction. Please try again.";

#[derive(Error, Debug)]
pub enum WebServerError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Server startup error: {0}")]
    ServerStartup(String),

    #[error("Invalid request format: {details}")]
    InvalidRequest { details: String },

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ReconcilerError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WebServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Resolution(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the caller
    fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest { details } => details.clone(),
            Self::Resolution(ReconcilerError::InvalidSubmission { reason }) => reason.clone(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for WebServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            process_error!(ProcessId::current(), error = %self, "❌ Request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub type WebServerResult<T> = Result<T, WebServerError>;
