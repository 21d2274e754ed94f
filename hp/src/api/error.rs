//! Planning service error types

use thiserror::Error;

/// Errors that can occur talking to the planning service
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No response body")]
    NoBody,

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A plan is already being generated")]
    Busy,
}

impl ApiError {
    /// Whether this failure came from the transport rather than the caller
    pub fn is_transport(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::NoBody | ApiError::Stream(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Json(_) | ApiError::InvalidInput(_) | ApiError::NotFound(_) | ApiError::Busy => false,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
