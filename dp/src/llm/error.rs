//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key not set: {0} is empty or missing")]
    MissingCredential(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used when reporting a degraded answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Credential,
    Timeout,
    Connection,
    ApiStatus,
    Parse,
}

impl LlmError {
    /// Map the error onto the failure class reported to users
    pub fn failure_class(&self) -> FailureClass {
        match self {
            LlmError::MissingCredential(_) => FailureClass::Credential,
            LlmError::Timeout(_) => FailureClass::Timeout,
            LlmError::Network(e) if e.is_timeout() => FailureClass::Timeout,
            LlmError::Network(e) if e.is_decode() => FailureClass::Parse,
            LlmError::Network(_) => FailureClass::Connection,
            LlmError::ApiError { .. } => FailureClass::ApiStatus,
            LlmError::InvalidResponse(_) | LlmError::Json(_) => FailureClass::Parse,
        }
    }
}
