//! Error types for NATHAC LLM clients

use thiserror::Error;

/// Result type alias for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// LLM client errors
#[derive(Debug, Error)]
pub enum LLMError {
    /// Vendor answered with a non-success status
    #[error("External API call failed: {0}")]
    ApiCallFailed(String),

    /// Response body was not valid JSON
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport failure (connect, send or body read)
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Vendor answered, but the payload carried no usable content
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}
