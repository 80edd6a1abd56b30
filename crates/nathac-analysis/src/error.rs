//! Analysis error types

use nathac_llm::LLMError;
use std::time::Duration;
use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Analysis error type
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Provider name outside the supported set
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Selected provider has no API key configured
    #[error("Missing API key for provider '{provider}'")]
    MissingCredential { provider: String },

    /// Vendor call failed
    #[error("AI provider failed: {0}")]
    Provider(#[from] LLMError),

    /// Vendor call exceeded the per-call timeout
    #[error("AI provider timed out after {0:?}")]
    Timeout(Duration),

    /// Model answered but no valid outcome could be recovered
    #[error("Malformed model output: {reason} (snippet: {snippet:?})")]
    MalformedOutput { reason: String, snippet: String },
}

/// How a per-subject failure is reported in a degraded outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Vendor error, network error or timeout
    Provider,
    /// Response could not be recovered or failed validation
    MalformedOutput,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider_failure",
            Self::MalformedOutput => "malformed_output",
        }
    }

    /// Human-readable prefix used in degraded risk drivers
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Provider => "AI analysis unavailable (model/network failure)",
            Self::MalformedOutput => "AI analysis unavailable (malformed model output)",
        }
    }
}

impl AnalysisError {
    /// Errors that abort a whole batch rather than one subject
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProvider(_) | Self::MissingCredential { .. }
        )
    }

    /// Classify a per-subject failure
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::MalformedOutput { .. } => FailureClass::MalformedOutput,
            _ => FailureClass::Provider,
        }
    }
}
