//! Text-generation backend errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to a text-generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum BackendError {
    /// API request failed with the given message
    #[error("API error{}: {message}", .status_code.map(|c| format!(" ({})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    #[error("Request timed out after {seconds} seconds")]
    TimeoutError { seconds: u64 },

    /// Invalid or malformed response from the service
    #[error("Invalid response from LLM: {message}")]
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// The service answered but produced no text
    #[error("LLM returned an empty completion")]
    EmptyCompletion,

    /// Model is not available on the server
    #[error("Model '{model}' not found. Please pull it with: ollama pull {model}")]
    ModelNotFound { model: String },

    /// Configuration error (bad endpoint, client construction, etc.)
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Network-related error
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Generic error for other cases
    #[error("Error: {message}")]
    Other { message: String },
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::TimeoutError { .. })
    }
}
